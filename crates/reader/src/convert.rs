use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;
use usage_core::{
    BurnRate, SessionBlock, TokenCounts, UNKNOWN_SESSION_ID, UsagePredictions, UsageTotals,
};

use crate::attrs::{Attributes, resolve_f64, resolve_single, value_as_u64};
use crate::props::{Properties, extract};
use crate::time::normalize_datetime;
use crate::types::ConvertError;

const SESSION_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("is_active", "is_active"),
    ("cost_usd", "cost_usd"),
    ("sent_messages_count", "sent_messages_count"),
    ("start_time", "start_time"),
    ("end_time", "end_time"),
    ("token_counts", "token_counts"),
    ("burn_rate", "burn_rate"),
    ("models", "models"),
    ("per_model_stats", "per_model_stats"),
];

const TOKEN_FIELDS: &[(&str, &str)] = &[
    ("input_tokens", "token_counts.input_tokens"),
    ("output_tokens", "token_counts.output_tokens"),
    ("cache_creation_tokens", "token_counts.cache_creation_tokens"),
    ("cache_read_tokens", "token_counts.cache_read_tokens"),
];

const BURN_RATE_FIELDS: &[(&str, &str)] = &[
    ("tokens_per_minute", "burn_rate.tokens_per_minute"),
    ("cost_per_hour", "burn_rate.cost_per_hour"),
];

pub fn convert_session<A: Attributes + ?Sized>(raw: Option<&A>) -> SessionBlock {
    convert_session_at(raw, Utc::now())
}

/// Like [`convert_session`], with "now" supplied by the caller.
pub fn convert_session_at<A: Attributes + ?Sized>(
    raw: Option<&A>,
    now: DateTime<Utc>,
) -> SessionBlock {
    let Some(raw) = raw else {
        return SessionBlock::placeholder(UNKNOWN_SESSION_ID, now);
    };
    match try_convert_session(raw, now) {
        Ok(block) => block,
        Err(err) => {
            let id = session_id(&resolve_single(Some(raw), "id", Value::Null))
                .unwrap_or_else(|| UNKNOWN_SESSION_ID.to_string());
            warn!(session_id = %id, error = %err, "session conversion failed, using placeholder");
            SessionBlock::placeholder(id, now)
        }
    }
}

/// Strict conversion: absent fields take defaults, malformed ones are errors.
pub fn try_convert_session<A: Attributes + ?Sized>(
    raw: &A,
    now: DateTime<Utc>,
) -> Result<SessionBlock, ConvertError> {
    let props = extract(raw, SESSION_FIELDS);

    let id = match props.get("id") {
        Some(value) => session_id(value).ok_or_else(|| ConvertError::invalid("id", value))?,
        None => UNKNOWN_SESSION_ID.to_string(),
    };
    let is_active = match props.get("is_active") {
        Some(value) => value
            .as_bool()
            .ok_or_else(|| ConvertError::invalid("is_active", value))?,
        None => false,
    };
    let cost_usd = match props.get("cost_usd") {
        Some(value) => value
            .as_f64()
            .filter(|cost| cost.is_finite() && *cost >= 0.0)
            .ok_or_else(|| ConvertError::invalid("cost_usd", value))?,
        None => 0.0,
    };
    let sent_messages_count = counter(&props, "sent_messages_count")?;

    let start_time = normalize_datetime(props.get("start_time")).unwrap_or(now);
    let end_time = normalize_datetime(props.get("end_time")).unwrap_or(now);

    let token_counts = match props.get("token_counts") {
        Some(Value::Object(_)) => {
            let tokens = extract(raw, TOKEN_FIELDS);
            TokenCounts::new(
                counter(&tokens, "input_tokens")?,
                counter(&tokens, "output_tokens")?,
                counter(&tokens, "cache_creation_tokens")?,
                counter(&tokens, "cache_read_tokens")?,
            )
        }
        Some(other) => return Err(ConvertError::invalid("token_counts", other)),
        None => TokenCounts::default(),
    };

    let burn_rate = match props.get("burn_rate") {
        Some(Value::Object(_)) => {
            let rate = extract(raw, BURN_RATE_FIELDS);
            Some(BurnRate {
                tokens_per_minute: rate_field(&rate, "tokens_per_minute")?,
                cost_per_hour: rate_field(&rate, "cost_per_hour")?,
            })
        }
        Some(other) => return Err(ConvertError::invalid("burn_rate", other)),
        None => None,
    };

    let models = match props.get("models") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ConvertError::invalid("models", item))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(ConvertError::invalid("models", other)),
        None => Vec::new(),
    };

    let per_model_stats = match props.get("per_model_stats") {
        Some(Value::Object(map)) => map.clone(),
        Some(other) => return Err(ConvertError::invalid("per_model_stats", other)),
        None => Map::new(),
    };

    Ok(SessionBlock {
        id,
        start_time,
        end_time,
        is_active,
        token_counts,
        cost_usd,
        burn_rate,
        models,
        sent_messages_count,
        per_model_stats,
    })
}

/// Aggregate burn rate; `None` when the upstream supplied none. Unreadable
/// sub-fields default to zero.
pub fn convert_burn_rate<A: Attributes + ?Sized>(raw: Option<&A>) -> Option<BurnRate> {
    let rate = resolve_single(raw, "burn_rate", Value::Null);
    if !rate.is_object() {
        return None;
    }
    Some(BurnRate {
        tokens_per_minute: resolve_f64(Some(&rate), "tokens_per_minute", 0.0),
        cost_per_hour: resolve_f64(Some(&rate), "cost_per_hour", 0.0),
    })
}

/// Predictions never default to "now": an unresolved estimate stays unknown.
pub fn convert_predictions<A: Attributes + ?Sized>(raw: Option<&A>) -> UsagePredictions {
    UsagePredictions {
        tokens_run_out: normalize_datetime(&resolve_single(raw, "tokens_run_out", Value::Null)),
        limit_resets_at: normalize_datetime(&resolve_single(raw, "limit_resets_at", Value::Null)),
    }
}

pub fn convert_totals<A: Attributes + ?Sized>(raw: Option<&A>) -> UsageTotals {
    UsageTotals {
        cost_percentage: resolve_f64(raw, "cost_percentage", 0.0),
        token_percentage: resolve_f64(raw, "token_percentage", 0.0),
        message_percentage: resolve_f64(raw, "message_percentage", 0.0),
        time_to_reset_percentage: resolve_f64(raw, "time_to_reset_percentage", 0.0),
    }
}

fn session_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn counter(props: &Properties<'_>, field: &'static str) -> Result<u64, ConvertError> {
    match props.get(field) {
        Some(value) => value_as_u64(value).ok_or_else(|| ConvertError::invalid(field, value)),
        None => Ok(0),
    }
}

fn rate_field(props: &Properties<'_>, field: &'static str) -> Result<f64, ConvertError> {
    match props.get(field) {
        Some(value) => value
            .as_f64()
            .ok_or_else(|| ConvertError::invalid(field, value)),
        None => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn absent_session_is_placeholder() {
        let block = convert_session_at(None::<&Value>, now());
        assert_eq!(block.id, UNKNOWN_SESSION_ID);
        assert_eq!(block.start_time, now());
        assert_eq!(block.end_time, now());
        assert_eq!(block.token_counts, TokenCounts::default());
        assert_eq!(block.total_tokens(), 0);
        assert!(block.burn_rate.is_none());

        let block = convert_session(None::<&Value>);
        assert!(block.start_time <= Utc::now());
    }

    #[test]
    fn tokens_without_burn_rate() {
        let raw = json!({
            "start_time": 1_700_000_000,
            "token_counts": {
                "input_tokens": 10,
                "output_tokens": 5,
                "cache_creation_tokens": 0,
                "cache_read_tokens": 0
            }
        });
        let block = convert_session(Some(&raw));
        assert_eq!(block.token_counts.total_tokens(), 15);
        assert!(block.burn_rate.is_none());
        assert_eq!(block.start_time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn full_session_is_mapped() {
        let raw = json!({
            "id": "block-1",
            "is_active": true,
            "cost_usd": 1.25,
            "sent_messages_count": 42,
            "start_time": "2025-06-01T03:00:00Z",
            "end_time": "2025-06-01T08:00:00Z",
            "token_counts": {"input_tokens": 100, "output_tokens": 50, "cache_read_tokens": 7},
            "burn_rate": {"tokens_per_minute": 12.5, "cost_per_hour": 0.4},
            "models": ["claude-opus", "claude-sonnet"],
            "per_model_stats": {"claude-opus": {"tokens": 120}}
        });
        let block = convert_session_at(Some(&raw), now());
        assert_eq!(block.id, "block-1");
        assert!(block.is_active);
        assert_eq!(block.cost_usd, 1.25);
        assert_eq!(block.total_cost(), 1.25);
        assert_eq!(block.sent_messages_count, 42);
        assert_eq!(block.start_time, Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap());
        assert_eq!(block.end_time, now());
        assert_eq!(block.token_counts.cache_creation_tokens, 0);
        assert_eq!(block.total_tokens(), 157);
        assert_eq!(
            block.burn_rate,
            Some(BurnRate {
                tokens_per_minute: 12.5,
                cost_per_hour: 0.4
            })
        );
        assert_eq!(block.models, vec!["claude-opus", "claude-sonnet"]);
        assert_eq!(block.per_model_stats["claude-opus"]["tokens"], 120);
    }

    #[test]
    fn timestamps_default_to_now_independently() {
        let raw = json!({"id": 7, "start_time": "garbage", "end_time": 1_700_000_000});
        let block = convert_session_at(Some(&raw), now());
        assert_eq!(block.id, "7");
        assert_eq!(block.start_time, now());
        assert_eq!(block.end_time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn partial_burn_rate_defaults_to_zero() {
        let raw = json!({"id": "b", "burn_rate": {"tokens_per_minute": 3.0}});
        let block = convert_session_at(Some(&raw), now());
        assert_eq!(
            block.burn_rate,
            Some(BurnRate {
                tokens_per_minute: 3.0,
                cost_per_hour: 0.0
            })
        );
    }

    #[test]
    fn malformed_session_falls_back_keeping_id() {
        let raw = json!({
            "id": "broken",
            "cost_usd": "expensive",
            "token_counts": {"input_tokens": 10}
        });
        assert!(try_convert_session(&raw, now()).is_err());

        let block = convert_session_at(Some(&raw), now());
        assert_eq!(block.id, "broken");
        assert_eq!(block.total_tokens(), 0);
        assert_eq!(block.cost_usd, 0.0);
    }

    #[test]
    fn negative_counters_are_rejected() {
        let raw = json!({"token_counts": {"input_tokens": -1}});
        let err = try_convert_session(&raw, now()).expect_err("invalid");
        assert!(matches!(
            err,
            ConvertError::InvalidField {
                field: "input_tokens",
                ..
            }
        ));
        let block = convert_session_at(Some(&raw), now());
        assert_eq!(block.id, UNKNOWN_SESSION_ID);
    }

    #[test]
    fn non_string_models_are_rejected() {
        let raw = json!({"id": "m", "models": ["ok", 3]});
        assert!(try_convert_session(&raw, now()).is_err());
    }

    #[test]
    fn aggregate_helpers_default_without_now() {
        let data = json!({
            "burn_rate": {"tokens_per_minute": "fast", "cost_per_hour": 2.0},
            "predictions": {"tokens_run_out": "2025-06-01T10:00:00Z", "limit_resets_at": null},
            "totals": {"cost_percentage": 140.0, "token_percentage": 20}
        });
        let rate = convert_burn_rate(Some(&data)).expect("burn rate");
        assert_eq!(rate.tokens_per_minute, 0.0);
        assert_eq!(rate.cost_per_hour, 2.0);

        let predictions = data.get("predictions");
        let predictions = convert_predictions(predictions);
        assert_eq!(
            predictions.tokens_run_out,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(predictions.limit_resets_at, None);

        let totals = convert_totals(data.get("totals"));
        assert_eq!(totals.cost_percentage, 140.0);
        assert_eq!(totals.token_percentage, 20.0);
        assert_eq!(totals.message_percentage, 0.0);

        assert_eq!(convert_burn_rate(Some(&json!({}))), None);
        assert_eq!(convert_predictions(None::<&Value>), UsagePredictions::default());
    }
}
