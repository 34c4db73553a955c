//! Parsing for the non-monetary fields of JSON request bodies.

use serde_json::Value;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse the request field `field` as an ISO 8601 calendar date, e.g. "2024-01-31".
///
/// # Errors
/// Returns an [Error::InvalidField] if the field is missing or is not a date.
pub fn parse_date(field: &'static str, raw: Option<&Value>) -> Result<Date, Error> {
    match raw {
        None | Some(Value::Null) => Err(Error::InvalidField {
            field,
            message: "This field is required.".to_owned(),
        }),
        Some(Value::String(text)) => {
            Date::parse(text.trim(), DATE_FORMAT).map_err(|_| wrong_date_format(field))
        }
        Some(_) => Err(wrong_date_format(field)),
    }
}

fn wrong_date_format(field: &'static str) -> Error {
    Error::InvalidField {
        field,
        message: "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.".to_owned(),
    }
}

/// Get the text of the request field `field`, treating a missing field or `null` as empty.
///
/// # Errors
/// Returns an [Error::InvalidField] if the field is not a string.
pub fn optional_text(field: &'static str, raw: Option<&Value>) -> Result<String, Error> {
    match raw {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.to_owned()),
        Some(_) => Err(Error::InvalidField {
            field,
            message: "Not a valid string.".to_owned(),
        }),
    }
}

/// Get the text of the request field `field`.
///
/// # Errors
/// Returns an [Error::InvalidField] if the field is missing or is not a string.
pub fn required_text(field: &'static str, raw: Option<&Value>) -> Result<String, Error> {
    match raw {
        None | Some(Value::Null) => Err(Error::InvalidField {
            field,
            message: "This field is required.".to_owned(),
        }),
        raw => optional_text(field, raw),
    }
}
