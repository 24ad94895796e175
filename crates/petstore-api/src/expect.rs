use std::fmt::Debug;

use serde_json::Value;

use crate::client::StoreResponse;
use crate::error::AssertionFailure;
use crate::order::FieldMismatch;

pub fn expect_eq<T: PartialEq + Debug>(
    expected: T,
    actual: T,
    message: &str,
) -> Result<(), AssertionFailure> {
    if expected == actual {
        return Ok(());
    }
    Err(AssertionFailure {
        message: message.to_string(),
        expected: format!("{expected:?}"),
        actual: format!("{actual:?}"),
    })
}

/// Compare the response's `message` field exactly, casing included.
pub fn expect_message(
    response: &StoreResponse,
    expected: &str,
    message: &str,
) -> Result<(), AssertionFailure> {
    expect_eq(Some(expected), response.message(), message)
}

pub fn expect_non_empty_object(body: &Value, message: &str) -> Result<(), AssertionFailure> {
    match body.as_object() {
        Some(map) if !map.is_empty() => Ok(()),
        _ => Err(AssertionFailure {
            message: message.to_string(),
            expected: "non-empty object".into(),
            actual: body.to_string(),
        }),
    }
}

pub fn expect_no_mismatches(
    mismatches: &[FieldMismatch],
    message: &str,
) -> Result<(), AssertionFailure> {
    if mismatches.is_empty() {
        return Ok(());
    }
    Err(AssertionFailure {
        message: message.to_string(),
        expected: render(mismatches, false),
        actual: render(mismatches, true),
    })
}

fn render(mismatches: &[FieldMismatch], returned: bool) -> String {
    mismatches
        .iter()
        .map(|m| {
            let value = if returned { &m.returned } else { &m.submitted };
            format!("{}={value}", m.field)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
