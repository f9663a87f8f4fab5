//! Request payload helpers: serde adapters for patch fields, date parsing and
//! mapping of extractor rejections onto `AppError::Validation`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};

use crate::errors::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::Validation`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}

/// Extract query-string filters, mapping parse errors to [`AppError::Validation`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}

/// Extract a path parameter (an entity id), mapping parse errors to [`AppError::Validation`].
pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}

/// Parses the date spellings a browser form or JSON client sends.
///
/// - RFC 3339 (`2024-03-01T09:30:00Z`, `2024-03-01T09:30:00+02:00`)
/// - local wall-clock time (`2024-03-01T09:30`, `2024-03-01T09:30:00.000`)
/// - calendar date (`2024-03-01`), taken as UTC midnight
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|ts| ts.with_timezone(&Utc))
                .ok_or_else(|| format!("'{raw}' does not exist in the server's time zone"));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(format!("invalid date '{raw}'"))
}

/// Deserializes a present-but-nullable field: absent → `None`, `null` →
/// `Some(None)`, value → `Some(Some(v))`. Pair with `#[serde(default)]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A non-nullable date field. `null` or a malformed string is an error.
pub fn date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).map(Some).map_err(de::Error::custom)
}

/// A nullable date field. `null` and `""` both clear the value.
pub fn nullable_date<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Some(None)),
        Some(raw) if raw.trim().is_empty() => Ok(Some(None)),
        Some(raw) => parse_datetime(&raw)
            .map(|ts| Some(Some(ts)))
            .map_err(de::Error::custom),
    }
}
