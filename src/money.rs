//! Validation, parsing and storage helpers for monetary amounts.
//!
//! Amounts are exact fixed-point decimals with two decimal places. They are
//! stored in SQLite as text so that no floating point rounding happens
//! between the request and the database.

use std::str::FromStr;

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::Error;

/// The number of digits kept after the decimal point.
pub const DECIMAL_PLACES: u32 = 2;

/// The total number of digits an amount may have, including the decimal places.
pub const MAX_DIGITS: u32 = 12;

/// Check that `amount` is a valid, positive amount of money.
///
/// # Errors
/// Returns an [Error::InvalidField] for `field` if the amount is zero or
/// negative, has more than two decimal places, or is too large to store.
pub fn validate_amount(field: &'static str, amount: Decimal) -> Result<Decimal, Error> {
    require_positive(field, amount, "Amount must be greater than zero.")?;

    validate_precision(field, amount)
}

/// Check that `amount` is greater than zero, reporting `message` otherwise.
///
/// # Errors
/// Returns an [Error::InvalidField] for `field` if the amount is zero or negative.
pub fn require_positive(
    field: &'static str,
    amount: Decimal,
    message: &str,
) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidField {
            field,
            message: message.to_owned(),
        });
    }

    Ok(amount)
}

/// Parse the decimal request field `field` from its raw JSON value.
///
/// Both JSON strings ("12.50") and JSON numbers (12.5) are accepted. Numbers
/// are parsed through their textual form so no binary floating point value
/// is ever used as an amount.
///
/// # Errors
/// Returns an [Error::InvalidField] if the field is missing, is not a decimal
/// number, or does not fit the two decimal place format.
pub fn parse_decimal(field: &'static str, raw: Option<&Value>) -> Result<Decimal, Error> {
    let text = match raw {
        None | Some(Value::Null) => {
            return Err(Error::InvalidField {
                field,
                message: "This field is required.".to_owned(),
            });
        }
        Some(Value::String(text)) => text.trim().to_owned(),
        Some(Value::Number(number)) => number.to_string(),
        Some(_) => String::new(),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| Error::InvalidField {
            field,
            message: "A valid number is required.".to_owned(),
        })?;

    validate_precision(field, amount)
}

/// Check that `amount` fits in the fixed-point column format.
///
/// # Errors
/// Returns an [Error::InvalidField] for `field` if there are more than two
/// decimal places or more than ten digits before the decimal point.
pub fn validate_precision(field: &'static str, amount: Decimal) -> Result<Decimal, Error> {
    if amount.normalize().scale() > DECIMAL_PLACES {
        return Err(Error::InvalidField {
            field,
            message: format!("Ensure that there are no more than {DECIMAL_PLACES} decimal places."),
        });
    }

    if amount.abs().trunc() >= max_whole_amount() {
        return Err(Error::InvalidField {
            field,
            message: format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                MAX_DIGITS - DECIMAL_PLACES
            ),
        });
    }

    Ok(amount)
}

fn max_whole_amount() -> Decimal {
    Decimal::from(10_i64.pow(MAX_DIGITS - DECIMAL_PLACES))
}

const AMOUNT_REQUIRED_MSG: &str = "Amount is required.";
const AMOUNT_NOT_POSITIVE_MSG: &str = "Amount must be a positive number.";

/// Parse the amount of an add-funds request.
///
/// A missing amount, `null`, an empty string, `false` and the number zero all
/// count as "no amount given". Strings are parsed as decimals and JSON numbers
/// are parsed through their textual form, so `10.1` is exactly `10.1`.
///
/// # Errors
/// Returns an [Error::InvalidInput] if the amount is missing, is not a
/// number, is not positive, or has more than two decimal places. Input is
/// never coerced into a different amount.
pub fn parse_contribution(raw: Option<&Value>) -> Result<Decimal, Error> {
    let text = match raw {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            return Err(Error::InvalidInput(AMOUNT_REQUIRED_MSG.to_owned()));
        }
        Some(Value::String(text)) if text.is_empty() => {
            return Err(Error::InvalidInput(AMOUNT_REQUIRED_MSG.to_owned()));
        }
        Some(Value::Number(number)) if number.as_f64() == Some(0.0) => {
            return Err(Error::InvalidInput(AMOUNT_REQUIRED_MSG.to_owned()));
        }
        Some(Value::String(text)) => text.trim().to_owned(),
        Some(Value::Number(number)) => number.to_string(),
        Some(_) => return Err(Error::InvalidInput(AMOUNT_NOT_POSITIVE_MSG.to_owned())),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| Error::InvalidInput(AMOUNT_NOT_POSITIVE_MSG.to_owned()))?;

    if amount <= Decimal::ZERO || validate_precision("amount", amount).is_err() {
        return Err(Error::InvalidInput(AMOUNT_NOT_POSITIVE_MSG.to_owned()));
    }

    Ok(amount)
}

/// Round `amount` to whole cents and give it exactly two decimal places, so
/// that zero is displayed as "0.00".
pub fn round_to_cents(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp(DECIMAL_PLACES);
    amount.rescale(DECIMAL_PLACES);
    amount
}

/// Format `amount` for storage with exactly two decimal places, e.g. "12.50".
pub fn to_sql_text(amount: Decimal) -> String {
    round_to_cents(amount).to_string()
}

/// Read a decimal amount stored as text from column `index` of `row`.
pub fn decimal_from_row(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw: String = row.get(index)?;

    Decimal::from_str(&raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

#[cfg(test)]
mod validate_amount_tests {
    use rust_decimal_macros::dec;

    use crate::{Error, money::validate_amount};

    #[test]
    fn accepts_smallest_amount() {
        assert_eq!(validate_amount("amount", dec!(0.01)), Ok(dec!(0.01)));
    }

    #[test]
    fn rejects_zero_and_negative() {
        for amount in [dec!(0), dec!(0.00), dec!(-5)] {
            assert!(
                matches!(
                    validate_amount("amount", amount),
                    Err(Error::InvalidField { field: "amount", .. })
                ),
                "want {amount} rejected"
            );
        }
    }

    #[test]
    fn rejects_more_than_two_decimal_places() {
        assert!(validate_amount("amount", dec!(1.005)).is_err());
    }

    #[test]
    fn trailing_zeros_do_not_count_as_decimal_places() {
        assert_eq!(validate_amount("amount", dec!(1.5000)), Ok(dec!(1.5000)));
    }

    #[test]
    fn rejects_amounts_that_do_not_fit() {
        assert!(validate_amount("amount", dec!(9999999999.99)).is_ok());
        assert!(validate_amount("amount", dec!(10000000000.00)).is_err());
    }
}
