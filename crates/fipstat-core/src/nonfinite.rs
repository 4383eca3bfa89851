//! Serde helpers for floats that may be NaN or infinite.
//!
//! JSON has no NaN or infinity, so `serde_json` writes them as `null` and
//! then refuses `null` for a plain `f64`. Fields that can hold an undefined
//! value use these helpers through `#[serde(with = "...")]`: serialization
//! is unchanged and `null` reads back as NaN.
//!
//! Infinities therefore come back as NaN after a JSON round trip. Both mean
//! "no finite value" to every consumer in this workspace.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn or_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

/// A single `f64`.
pub mod scalar {
    use super::*;

    /// Serialize as a plain float.
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*value)
    }

    /// Deserialize a float, reading `null` as NaN.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Option::<f64>::deserialize(deserializer).map(or_nan)
    }
}

/// A `Vec<f64>`.
pub mod vec {
    use super::*;

    /// Serialize as a plain sequence of floats.
    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        values.serialize(serializer)
    }

    /// Deserialize a sequence, reading each `null` element as NaN.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(or_nan).collect())
    }
}

/// An `Option<Vec<f64>>`; a missing sequence stays `None`.
pub mod option_vec {
    use super::*;

    /// Serialize as an optional sequence of floats.
    pub fn serialize<S: Serializer>(
        values: &Option<Vec<f64>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        values.serialize(serializer)
    }

    /// Deserialize an optional sequence, reading each `null` element as NaN.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<f64>>, D::Error> {
        let values = Option::<Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(values.map(|v| v.into_iter().map(or_nan).collect()))
    }
}
