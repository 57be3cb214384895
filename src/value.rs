//! Typed field values
//!
//! Raw request strings are coerced exactly once, at the request boundary, into a
//! [`FieldValue`]. The query builder only ever sees these tagged values and binds
//! them as statement parameters.

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};
use uuid::Uuid;

static ISO_DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-[01]\d-[0-3]\dT[0-2]\d:[0-5]\d(:[0-5]\d(\.\d+)?)?([+-][0-2]\d:[0-5]\d|Z)$")
        .expect("ISO date-time pattern is valid")
});

/// A coerced field value ready to be bound as a statement parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Raw `"true"` / `"false"`
    Bool(bool),
    /// Complete ISO-8601 date-time with zone, plus the text it was parsed from
    Timestamp {
        /// The instant
        at: DateTime<Utc>,
        /// Client text, bound verbatim into text columns
        raw: String,
    },
    /// Anything else, kept verbatim
    Text(String),
    /// Explicit absence, stored as SQL NULL
    Null,
}

impl FieldValue {
    /// Coerce a raw value on the read path: boolean, then ISO-8601, then text
    #[must_use]
    pub fn coerce_filter(raw: &str) -> Self {
        if let Some(flag) = parse_bool(raw) {
            return Self::Bool(flag);
        }
        if let Some(at) = parse_iso8601(raw) {
            return Self::Timestamp {
                at,
                raw: raw.to_string(),
            };
        }
        Self::Text(raw.to_string())
    }

    /// Coerce a raw value on the update path: boolean, otherwise text
    ///
    /// Dates are not recognised here.
    #[must_use]
    pub fn coerce_update(raw: &str) -> Self {
        parse_bool(raw).map_or_else(|| Self::Text(raw.to_string()), Self::Bool)
    }

    /// Timestamp generated server side
    #[must_use]
    pub fn timestamp(at: DateTime<Utc>) -> Self {
        Self::Timestamp {
            at,
            raw: at.to_rfc3339(),
        }
    }

    /// Bind an optional string, mapping absent or empty to [`FieldValue::Null`]
    #[must_use]
    pub fn text_or_null(raw: Option<&str>) -> Self {
        match raw {
            Some(text) if !text.is_empty() => Self::Text(text.to_string()),
            _ => Self::Null,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse a complete ISO-8601 date-time
///
/// Requires `YYYY-MM-DDTHH:MM`, optional seconds and fraction, and a `Z` or
/// `±HH:MM` zone. Bare dates and zone-less date-times are not timestamps.
#[must_use]
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if !ISO_DATE_TIME.is_match(raw) {
        return None;
    }

    // Only ASCII got past the pattern; byte 16 follows the minutes
    let with_seconds = if raw.as_bytes().get(16) == Some(&b':') {
        raw.to_string()
    } else {
        format!("{}:00{}", &raw[..16], &raw[16..])
    };

    DateTime::parse_from_rfc3339(&with_seconds)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

fn is_text_type(ty: &Type) -> bool {
    matches!(*ty, Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME)
}

impl ToSql for FieldValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(flag) if *ty == Type::BOOL => flag.to_sql(ty, out),
            Self::Bool(flag) if is_text_type(ty) => {
                (if *flag { "true" } else { "false" }).to_sql(ty, out)
            }
            Self::Timestamp { at, .. } if *ty == Type::TIMESTAMPTZ => at.to_sql(ty, out),
            Self::Timestamp { at, .. } if *ty == Type::TIMESTAMP => {
                at.naive_utc().to_sql(ty, out)
            }
            Self::Timestamp { raw, .. } if is_text_type(ty) => raw.as_str().to_sql(ty, out),
            Self::Text(text) if *ty == Type::UUID => Uuid::parse_str(text)?.to_sql(ty, out),
            Self::Text(text) if is_text_type(ty) => text.as_str().to_sql(ty, out),
            other => Err(format!("cannot bind {other:?} to a column of type {ty}").into()),
        }
    }

    fn accepts(ty: &Type) -> bool {
        is_text_type(ty)
            || matches!(
                *ty,
                Type::BOOL | Type::TIMESTAMPTZ | Type::TIMESTAMP | Type::UUID
            )
    }

    tokio_postgres::types::to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_coerce_filter_booleans() {
        assert_eq!(FieldValue::coerce_filter("true"), FieldValue::Bool(true));
        assert_eq!(FieldValue::coerce_filter("false"), FieldValue::Bool(false));
        assert_eq!(
            FieldValue::coerce_filter("True"),
            FieldValue::Text("True".to_string())
        );
    }

    #[test]
    fn test_coerce_filter_dates() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for raw in [
            "2024-03-01T00:00:00.000Z",
            "2024-03-01T00:00:00Z",
            "2024-03-01T02:00:00+02:00",
            "2024-03-01T00:00Z",
            "2024-02-29T22:00-02:00",
        ] {
            match FieldValue::coerce_filter(raw) {
                FieldValue::Timestamp { at, raw: kept } => {
                    assert_eq!(at, midnight, "{raw:?}");
                    assert_eq!(kept, raw);
                }
                other => panic!("{raw:?} coerced to {other:?}"),
            }
        }
    }

    #[test]
    fn test_coerce_filter_incomplete_dates_stay_text() {
        for raw in [
            "2024-03-01",
            "2024-03-01T00:00",
            "2024-03-01T00:00:00",
            "2024-03-01 00:00:00Z",
            "2024-03",
            "2024-03-01 and more",
            "2024-13-01T00:00:00Z",
            "2024-02-30T00:00:00Z",
            "20240301",
            "Title",
        ] {
            assert_eq!(
                FieldValue::coerce_filter(raw),
                FieldValue::Text(raw.to_string()),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_coerce_update_ignores_dates() {
        assert_eq!(FieldValue::coerce_update("false"), FieldValue::Bool(false));
        assert_eq!(
            FieldValue::coerce_update("2024-03-01"),
            FieldValue::Text("2024-03-01".to_string())
        );
    }

    #[test]
    fn test_text_or_null() {
        assert_eq!(FieldValue::text_or_null(None), FieldValue::Null);
        assert_eq!(FieldValue::text_or_null(Some("")), FieldValue::Null);
        assert_eq!(
            FieldValue::text_or_null(Some("Joe")),
            FieldValue::Text("Joe".to_string())
        );
    }

    #[test]
    fn test_bind_bool_into_text_column() {
        let mut out = BytesMut::new();
        let is_null = FieldValue::Bool(true).to_sql(&Type::TEXT, &mut out).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(&out[..], b"true");
    }

    #[test]
    fn test_bind_malformed_uuid_fails() {
        let mut out = BytesMut::new();
        assert!(FieldValue::Text("invalidId".to_string())
            .to_sql(&Type::UUID, &mut out)
            .is_err());
    }

    #[test]
    fn test_bind_text_into_bool_column_fails() {
        let mut out = BytesMut::new();
        assert!(FieldValue::Text("yes".to_string())
            .to_sql(&Type::BOOL, &mut out)
            .is_err());
    }

    #[test]
    fn test_bind_timestamp_text_verbatim_into_text_column() {
        let mut out = BytesMut::new();
        FieldValue::coerce_filter("2024-03-01T00:00Z")
            .to_sql(&Type::TEXT, &mut out)
            .unwrap();
        assert_eq!(&out[..], b"2024-03-01T00:00Z");
    }

    #[test]
    fn test_null_binds_for_any_type() {
        let mut out = BytesMut::new();
        assert!(matches!(
            FieldValue::Null.to_sql(&Type::TEXT, &mut out).unwrap(),
            IsNull::Yes
        ));
    }
}
