// MAP estimation for the additive decomposition model.
//
// Every component of the model (linear trend with changepoints, Fourier
// seasonalities, holiday indicators) is linear in its coefficients, so the
// fit reduces to a regression y ~ X·θ with per-coefficient priors and a free
// observation noise. The objective is minimised with argmin's L-BFGS.

use argmin::core::{CostFunction, Error as ArgminError, Executor, Gradient, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

/// Scale of the half-normal prior on the observation noise.
const SIGMA_PRIOR_SCALE: f64 = 0.5;
/// Smoothing of |x| near zero for the Laplace prior.
const LAPLACE_EPS: f64 = 1e-8;
/// log(sigma) is clamped to this range while evaluating the objective.
const LOG_SIGMA_BOUND: f64 = 20.0;
/// Returned for parameter vectors containing NaN or infinities.
const INVALID_COST: f64 = 1e10;

/// Prior placed on one regression coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prior {
    /// Normal(0, sd)
    Normal(f64),
    /// Laplace(0, scale)
    Laplace(f64),
}

impl Prior {
    fn neg_log_density(&self, x: f64) -> f64 {
        match *self {
            Prior::Normal(sd) => 0.5 * x * x / (sd * sd),
            Prior::Laplace(b) => (x * x + LAPLACE_EPS).sqrt() / b,
        }
    }

    fn derivative(&self, x: f64) -> f64 {
        match *self {
            Prior::Normal(sd) => x / (sd * sd),
            Prior::Laplace(b) => x / (b * (x * x + LAPLACE_EPS).sqrt()),
        }
    }
}

/// Optimization configuration
#[derive(Clone, Debug)]
pub struct OptimizationConfig {
    pub max_iters: u64,
    pub tol_grad: f64,
    pub tol_cost: f64,
    pub history_size: usize, // For L-BFGS
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            max_iters: 10_000,
            tol_grad: 1e-8,
            tol_cost: 1e-12,
            history_size: 5,
        }
    }
}

/// Optimization result
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Regression coefficients followed by log(sigma_obs).
    pub params: Vec<f64>,
    pub neg_log_prob: f64,
    pub iterations: u64,
    pub converged: bool,
}

impl OptimizationResult {
    pub fn coefficients(&self) -> &[f64] {
        &self.params[..self.params.len() - 1]
    }

    pub fn sigma_obs(&self) -> f64 {
        self.params[self.params.len() - 1]
            .clamp(-LOG_SIGMA_BOUND, LOG_SIGMA_BOUND)
            .exp()
    }
}

/// Posterior of the regression y ~ Normal(X·θ, σ) with independent priors on
/// θ and a half-normal prior on σ. Parameters are `[θ..., log σ]`.
#[derive(Clone, Debug)]
pub struct MapProblem {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub priors: Vec<Prior>,
}

impl MapProblem {
    pub fn new(x: Array2<f64>, y: Array1<f64>, priors: Vec<Prior>) -> crate::Result<Self> {
        if x.nrows() != y.len() {
            return Err(crate::SeerError::DataValidation(format!(
                "design matrix has {} rows but y has {} values",
                x.nrows(),
                y.len()
            )));
        }
        if x.ncols() != priors.len() {
            return Err(crate::SeerError::DataValidation(format!(
                "design matrix has {} columns but {} priors were given",
                x.ncols(),
                priors.len()
            )));
        }
        Ok(Self { x, y, priors })
    }

    pub fn n_params(&self) -> usize {
        self.x.ncols() + 1
    }

    fn split<'a>(&self, params: ArrayView1<'a, f64>) -> (ArrayView1<'a, f64>, f64) {
        let p = self.x.ncols();
        let log_sigma = params[p].clamp(-LOG_SIGMA_BOUND, LOG_SIGMA_BOUND);
        (params.slice_move(ndarray::s![..p]), log_sigma)
    }

    fn residuals(&self, theta: ArrayView1<f64>) -> Array1<f64> {
        &self.y - &self.x.dot(&theta)
    }

    /// Negative log posterior, additive constants dropped.
    pub fn neg_log_prob(&self, params: ArrayView1<f64>) -> f64 {
        if params.iter().any(|p| !p.is_finite()) {
            return INVALID_COST;
        }
        let (theta, s) = self.split(params);
        let r = self.residuals(theta);
        let n = self.y.len() as f64;

        let likelihood = n * s + 0.5 * (-2.0 * s).exp() * r.dot(&r);
        let coef_prior: f64 = theta
            .iter()
            .zip(&self.priors)
            .map(|(&v, prior)| prior.neg_log_density(v))
            .sum();
        // half-normal on sigma, with the Jacobian of sigma = exp(s)
        let sigma_prior = (2.0 * s).exp() / (2.0 * SIGMA_PRIOR_SCALE * SIGMA_PRIOR_SCALE) - s;

        likelihood + coef_prior + sigma_prior
    }

    pub fn gradient(&self, params: ArrayView1<f64>) -> Array1<f64> {
        let p = self.x.ncols();
        if params.iter().any(|v| !v.is_finite()) {
            return Array1::zeros(p + 1);
        }
        let (theta, s) = self.split(params);
        let r = self.residuals(theta);
        let n = self.y.len() as f64;
        let inv_var = (-2.0 * s).exp();

        // X^T r, one column per task
        let xtr: Vec<f64> = (0..p)
            .into_par_iter()
            .map(|j| self.x.column(j).dot(&r))
            .collect();

        let mut grad = Array1::zeros(p + 1);
        for j in 0..p {
            grad[j] = -inv_var * xtr[j] + self.priors[j].derivative(theta[j]);
        }
        // flat in log(sigma) once it is clamped
        grad[p] = if params[p].abs() > LOG_SIGMA_BOUND {
            0.0
        } else {
            n - inv_var * r.dot(&r) + (2.0 * s).exp() / (SIGMA_PRIOR_SCALE * SIGMA_PRIOR_SCALE)
                - 1.0
        };
        grad
    }
}

impl CostFunction for MapProblem {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, ArgminError> {
        Ok(self.neg_log_prob(params.view()))
    }
}

impl Gradient for MapProblem {
    type Param = Array1<f64>;
    type Gradient = Array1<f64>;

    fn gradient(&self, params: &Self::Param) -> Result<Self::Gradient, ArgminError> {
        Ok(MapProblem::gradient(self, params.view()))
    }
}

fn optimization_error(e: ArgminError) -> crate::SeerError {
    crate::SeerError::Optimization(e.to_string())
}

/// Minimise the negative log posterior with L-BFGS, starting from `init`.
pub fn optimize(
    problem: MapProblem,
    init: Vec<f64>,
    config: &OptimizationConfig,
) -> crate::Result<OptimizationResult> {
    if init.len() != problem.n_params() {
        return Err(crate::SeerError::Optimization(format!(
            "expected {} initial parameters, got {}",
            problem.n_params(),
            init.len()
        )));
    }
    tracing::debug!(
        params = init.len(),
        rows = problem.y.len(),
        max_iters = config.max_iters,
        "starting L-BFGS"
    );

    // Standard Wolfe conditions
    let linesearch = MoreThuenteLineSearch::new()
        .with_c(1e-4, 0.9)
        .map_err(optimization_error)?;
    let solver = LBFGS::new(linesearch, config.history_size)
        .with_tolerance_grad(config.tol_grad)
        .map_err(optimization_error)?
        .with_tolerance_cost(config.tol_cost)
        .map_err(optimization_error)?;

    let start = std::time::Instant::now();
    let result = Executor::new(problem, solver)
        .configure(|state| {
            state
                .param(Array1::from_vec(init))
                .max_iters(config.max_iters)
                .target_cost(f64::NEG_INFINITY)
        })
        .run()
        .map_err(optimization_error)?;

    let state = result.state();
    let params = state
        .get_best_param()
        .ok_or_else(|| crate::SeerError::Optimization("no parameters found".to_string()))?
        .to_vec();
    let neg_log_prob = state.get_best_cost();
    let iterations = state.get_iter();
    let converged = iterations < config.max_iters;

    tracing::debug!(
        iterations,
        neg_log_prob,
        converged,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "L-BFGS finished"
    );

    Ok(OptimizationResult {
        params,
        neg_log_prob,
        iterations,
        converged,
    })
}
