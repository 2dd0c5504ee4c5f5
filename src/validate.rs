//! Target-date parsing for user input.
//!
//! Only the exact `DD-MM-YYYY` shape is accepted: two digits, dash, two
//! digits, dash, four digits, naming a real calendar day. Input is not
//! trimmed and single-digit fields are rejected.

use chrono::NaiveDate;

const TARGET_FORMAT: &str = "%d-%m-%Y";

fn has_target_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a `DD-MM-YYYY` string into a calendar date.
pub fn parse_target_date(s: &str) -> crate::Result<NaiveDate> {
    if !has_target_shape(s) {
        return Err(crate::SeerError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, TARGET_FORMAT)
        .map_err(|_| crate::SeerError::InvalidDate(s.to_string()))
}

pub fn validate_date(s: &str) -> bool {
    parse_target_date(s).is_ok()
}

pub fn format_target_date(date: NaiveDate) -> String {
    date.format(TARGET_FORMAT).to_string()
}
