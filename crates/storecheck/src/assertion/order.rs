//! Sort-order checks over extracted record fields.

use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

/// Declared order of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Non-decreasing
    Asc,
    /// Non-increasing
    Desc,
}

impl SortOrder {
    /// Whether `ordering` between neighbours (left vs right) respects this order
    #[must_use]
    pub fn allows(self, ordering: Ordering) -> bool {
        match self {
            Self::Asc => ordering != Ordering::Greater,
            Self::Desc => ordering != Ordering::Less,
        }
    }

    /// Name used in messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(CheckError::UnsupportedConfig {
                setting: "sort order",
                value: other.to_string(),
                expected: "asc, desc",
            }),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
enum Key<'a> {
    Number(f64),
    Text(&'a str),
}

fn extract<'a>(items: &'a [Value], field: &str) -> CheckResult<Vec<Key<'a>>> {
    let keys = items
        .iter()
        .map(|item| match item.get(field) {
            Some(Value::Number(n)) => n.as_f64().map(Key::Number).ok_or_else(|| {
                CheckError::TypeMismatch {
                    check: "sequence-is-sorted",
                    expected: "finite number",
                    actual: n.to_string(),
                }
            }),
            Some(Value::String(s)) => Ok(Key::Text(s.as_str())),
            Some(other) => Err(CheckError::TypeMismatch {
                check: "sequence-is-sorted",
                expected: "number or string field",
                actual: other.to_string(),
            }),
            None => Err(CheckError::TypeMismatch {
                check: "sequence-is-sorted",
                expected: "object with the sort field",
                actual: format!("{item} (missing '{field}')"),
            }),
        })
        .collect::<CheckResult<Vec<_>>>()?;

    let numbers = keys.iter().filter(|k| matches!(k, Key::Number(_))).count();
    if numbers != 0 && numbers != keys.len() {
        return Err(CheckError::TypeMismatch {
            check: "sequence-is-sorted",
            expected: "all numbers or all strings",
            actual: format!("mixed values for field '{field}'"),
        });
    }
    Ok(keys)
}

fn compare(left: &Key<'_>, right: &Key<'_>) -> Ordering {
    match (left, right) {
        (Key::Number(a), Key::Number(b)) => a.total_cmp(b),
        (Key::Text(a), Key::Text(b)) => a.cmp(b),
        // extract() rejects mixed sequences
        _ => Ordering::Equal,
    }
}

/// Whether `field` of every item forms a sequence in `order`
///
/// Numbers compare numerically, strings lexicographically.
///
/// # Errors
///
/// Returns [`CheckError::TypeMismatch`] when an item lacks the field, the
/// field is neither number nor string, or numbers and strings are mixed.
pub fn is_sorted(items: &[Value], field: &str, order: SortOrder) -> CheckResult<bool> {
    let keys = extract(items, field)?;
    Ok(keys
        .windows(2)
        .all(|pair| order.allows(compare(&pair[0], &pair[1]))))
}
