//! Exact decimal amounts from JSON input
//!
//! Accepts a decimal string (`"1249.50"`) or a JSON number (`1249.50`).
//! Numbers are rebuilt from their shortest round-trip rendering, so a
//! literal such as `10.1` becomes exactly `10.1` rather than the binary
//! expansion of the nearest `f64`. Amounts with more than 15 significant
//! digits should be sent as strings.

use bigdecimal::BigDecimal;
use serde::de::{self, Visitor};
use serde::Deserializer;
use std::fmt;
use std::str::FromStr;

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = BigDecimal;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal amount as a number or string")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        BigDecimal::from_str(value.trim())
            .map_err(|_| E::custom(format!("invalid decimal amount: {}", value)))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(BigDecimal::from(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(BigDecimal::from(value))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if !value.is_finite() {
            return Err(E::custom("amount must be a finite number"));
        }
        // `Display` for f64 is the shortest string that parses back to it.
        self.visit_str(&value.to_string())
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}
