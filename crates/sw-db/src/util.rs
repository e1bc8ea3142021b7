use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Column-level codec failures. Repos flatten these into their own invalid
/// input errors, so the variants only matter for the message text.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("json column codec failed: {message}")]
    Json { message: String },
    #[error("enum column holds a non-string value: {value}")]
    NonStringEnum { value: String },
    #[error("timestamp column is not rfc3339: {value}")]
    BadTimestamp { value: String },
}

impl DbError {
    fn json(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

pub fn to_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn from_rfc3339(value: &str) -> Result<DateTime<Utc>, DbError> {
    let parsed = DateTime::parse_from_rfc3339(value).map_err(|_| DbError::BadTimestamp {
        value: value.to_string(),
    })?;
    Ok(parsed.with_timezone(&Utc))
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(DbError::json)
}

pub fn decode_json<T: DeserializeOwned>(value: &str) -> Result<T, DbError> {
    serde_json::from_str(value).map_err(DbError::json)
}

/// Enums persist as their serde string form, one bare word per column.
pub fn encode_enum<T: Serialize>(value: &T) -> Result<String, DbError> {
    match serde_json::to_value(value).map_err(DbError::json)? {
        Value::String(text) => Ok(text),
        other => Err(DbError::NonStringEnum {
            value: other.to_string(),
        }),
    }
}

pub fn decode_enum<T: DeserializeOwned>(value: &str) -> Result<T, DbError> {
    serde_json::from_value(Value::String(value.to_string())).map_err(DbError::json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_core::types::ReviewStatus;

    #[test]
    fn test_enum_round_trip_uses_wire_casing() {
        let encoded = encode_enum(&ReviewStatus::AutoFixing).expect("encode");
        assert_eq!(encoded, "AUTO_FIXING");
        let decoded: ReviewStatus = decode_enum(&encoded).expect("decode");
        assert_eq!(decoded, ReviewStatus::AutoFixing);
    }

    #[test]
    fn test_decode_enum_rejects_unknown_value() {
        assert!(decode_enum::<ReviewStatus>("PENDING").is_err());
    }

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc::now();
        let parsed = from_rfc3339(&to_rfc3339(&now)).expect("parse");
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        assert!(from_rfc3339("yesterday").is_err());
    }
}
