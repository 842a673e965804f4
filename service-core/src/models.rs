//! Wire types shared by the gateway and lookup services.

use crate::validation::validate_cep;
use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

/// Body of `POST /` on the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LookupRequest {
    /// Absent and `null` both decode to the empty string and fail validation.
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "validate_cep"))]
    pub cep: String,
}

impl LookupRequest {
    /// Decode a request body, which must be a JSON object.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice(body)? {
            Value::Object(fields) => serde_json::from_value(Value::Object(fields)),
            other => Err(serde_json::Error::invalid_type(
                unexpected(&other),
                &"a JSON object",
            )),
        }
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Query string of `GET /weather` on the lookup service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LookupQuery {
    #[serde(default)]
    #[validate(custom(function = "validate_cep"))]
    pub cep: String,
}

/// Current temperature for a locality, in three scales.
///
/// Construct through [`WeatherRecord::from_celsius`] so the Fahrenheit and
/// Kelvin values always derive from the Celsius reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
}

impl WeatherRecord {
    pub fn from_celsius(city: impl Into<String>, temp_c: f64) -> Self {
        Self {
            city: city.into(),
            temp_c,
            temp_f: temp_c * 1.8 + 32.0,
            temp_k: temp_c + 273.0,
        }
    }
}
