//! The `compare` condition.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ErrorCode, WardenError, WardenResult};
use crate::patterns::glob_match;
use crate::types::Operator;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap());

fn as_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !NUMBER_RE.is_match(text) {
        return None;
    }
    text.parse().ok()
}

/// Compare two already substituted operands.
///
/// Equality is numeric when both sides look like numbers and textual
/// otherwise. Ordering operators need numbers on both sides.
pub fn compare(left: &str, operator: Operator, right: &str) -> WardenResult<bool> {
    let numbers = as_number(left).zip(as_number(right));

    let result = match operator {
        Operator::Equal => match numbers {
            Some((l, r)) => l == r,
            None => left == right,
        },
        Operator::NotEqual => match numbers {
            Some((l, r)) => l != r,
            None => left != right,
        },
        Operator::Contains => left.contains(right),
        Operator::ContainsPattern => glob_match(left, right)?,
        Operator::Greater
        | Operator::Less
        | Operator::GreaterOrEqual
        | Operator::LessOrEqual => {
            let (l, r) = numbers.ok_or_else(|| {
                WardenError::evaluation(
                    ErrorCode::EvalNotNumeric,
                    format!("Could not compare {left} with {right}: they both need to be numbers!"),
                )
            })?;
            match operator {
                Operator::Greater => l > r,
                Operator::Less => l < r,
                Operator::GreaterOrEqual => l >= r,
                _ => l <= r,
            }
        }
    };

    Ok(result)
}
