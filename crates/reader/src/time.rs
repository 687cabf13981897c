use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Timestamp shapes the upstream is known to hand back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawTimestamp<'a> {
    Canonical(DateTime<Utc>),
    Integer(i64),
    Seconds(f64),
    Text(&'a str),
    Missing,
    Unsupported(&'static str),
}

impl From<DateTime<Utc>> for RawTimestamp<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Canonical(value)
    }
}

impl From<i64> for RawTimestamp<'_> {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for RawTimestamp<'_> {
    fn from(value: f64) -> Self {
        Self::Seconds(value)
    }
}

impl<'a> From<&'a str> for RawTimestamp<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a Value> for RawTimestamp<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Self::Missing,
            Value::Number(number) => match number.as_i64() {
                Some(integer) => Self::Integer(integer),
                None => number
                    .as_f64()
                    .map(Self::Seconds)
                    .unwrap_or(Self::Unsupported("number")),
            },
            Value::String(text) => Self::Text(text),
            Value::Bool(_) => Self::Unsupported("bool"),
            Value::Array(_) => Self::Unsupported("array"),
            Value::Object(_) => Self::Unsupported("object"),
        }
    }
}

impl<'a> From<Option<&'a Value>> for RawTimestamp<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map(Self::from).unwrap_or(Self::Missing)
    }
}

/// Coerces a timestamp into UTC. Epoch numbers are seconds; strings are ISO-8601.
/// Anything unparseable yields `None`.
pub fn normalize_datetime<'a>(value: impl Into<RawTimestamp<'a>>) -> Option<DateTime<Utc>> {
    match value.into() {
        RawTimestamp::Canonical(value) => Some(value),
        RawTimestamp::Integer(seconds) => {
            let parsed = DateTime::<Utc>::from_timestamp(seconds, 0);
            if parsed.is_none() {
                debug!(seconds, "epoch seconds out of range");
            }
            parsed
        }
        RawTimestamp::Seconds(seconds) => from_fractional_seconds(seconds),
        RawTimestamp::Text(raw) => {
            let parsed = parse_iso8601(raw);
            if parsed.is_none() {
                debug!(raw, "unparseable datetime string");
            }
            parsed
        }
        RawTimestamp::Missing => None,
        RawTimestamp::Unsupported(kind) => {
            debug!(kind, "unsupported datetime representation");
            None
        }
    }
}

fn from_fractional_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds.abs() > i64::MAX as f64 {
        debug!(seconds, "epoch seconds out of range");
        return None;
    }
    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::<Utc>::from_timestamp(whole as i64, nanos)
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn missing_value_is_none() {
        assert_eq!(normalize_datetime(None::<&Value>), None);
        assert_eq!(normalize_datetime(&Value::Null), None);
    }

    #[test]
    fn epoch_and_iso_agree() {
        assert_eq!(normalize_datetime(1_704_110_400_i64), Some(noon()));
        assert_eq!(normalize_datetime(&json!(1_704_110_400)), Some(noon()));
        assert_eq!(normalize_datetime("2024-01-01T12:00:00Z"), Some(noon()));
        assert_eq!(
            normalize_datetime("2024-01-01T12:00:00Z"),
            normalize_datetime(1_704_110_400_i64)
        );
    }

    #[test]
    fn canonical_is_unchanged() {
        assert_eq!(normalize_datetime(noon()), Some(noon()));
    }

    #[test]
    fn fractional_epoch_keeps_subseconds() {
        let parsed = normalize_datetime(1_704_110_400.5_f64).expect("parsed");
        assert_eq!(parsed.timestamp(), 1_704_110_400);
        assert_eq!(parsed.nanosecond(), 500_000_000);
        assert_eq!(normalize_datetime(f64::NAN), None);
    }

    #[test]
    fn accepts_common_iso_shapes() {
        assert_eq!(normalize_datetime("2024-01-01T12:00:00+00:00"), Some(noon()));
        assert_eq!(normalize_datetime("2024-01-01T14:00:00+02:00"), Some(noon()));
        assert_eq!(normalize_datetime("2024-01-01 12:00:00"), Some(noon()));
        assert_eq!(normalize_datetime("2024-01-01T12:00:00.000"), Some(noon()));
        assert_eq!(
            normalize_datetime("2024-01-01"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(normalize_datetime("not-a-date"), None);
        assert_eq!(normalize_datetime(""), None);
        assert_eq!(normalize_datetime("1704110400"), None);
        assert_eq!(normalize_datetime(&json!(true)), None);
        assert_eq!(normalize_datetime(&json!({"ts": 1})), None);
    }
}
