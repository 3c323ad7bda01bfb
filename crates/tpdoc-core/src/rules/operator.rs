//! Comparison operators for threshold conditions.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Operator applied as `value <op> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    GreaterOrEqual,
    Greater,
    Equal,
    Less,
    LessOrEqual,
}

impl ComparisonOperator {
    /// Parse an operator symbol. Accepts ASCII and Unicode forms.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            ">=" | "≥" | "=>" => Some(ComparisonOperator::GreaterOrEqual),
            ">" => Some(ComparisonOperator::Greater),
            "=" | "==" => Some(ComparisonOperator::Equal),
            "<" => Some(ComparisonOperator::Less),
            "<=" | "≤" | "=<" => Some(ComparisonOperator::LessOrEqual),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::Equal => "=",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessOrEqual => "<=",
        }
    }

    /// Apply the operator. Equality is exact.
    pub fn apply(&self, value: f64, threshold: f64) -> bool {
        match self {
            ComparisonOperator::GreaterOrEqual => value >= threshold,
            ComparisonOperator::Greater => value > threshold,
            ComparisonOperator::Equal => value == threshold,
            ComparisonOperator::Less => value < threshold,
            ComparisonOperator::LessOrEqual => value <= threshold,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for ComparisonOperator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for ComparisonOperator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        ComparisonOperator::from_symbol(&symbol)
            .ok_or_else(|| de::Error::custom(format!("unknown comparison operator '{}'", symbol)))
    }
}
