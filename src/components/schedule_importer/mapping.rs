use super::models::{
    EventFields, EventStatus, MappedEvent, MappingWarning, MetaEntry, RemoteEvent, Venue,
};
use super::time::{local_date_from_timestamp, parse_timezone};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde_json::Value;

/// Meta key holding the event website
pub const URL_KEY: &str = "URL";

/// Meta key holding the venue name
pub const VENUE_NAME_KEY: &str = "Venue Name";

/// Matches keys starting with `<word>` + one whitespace + `Date`, ignoring case.
/// `Start Date (YYYY-mm-dd)` and `start\tdate` both match `start`.
fn matches_date_key(key: &str, word: &str) -> bool {
    let mut chars = key.chars();

    let prefix: String = chars.by_ref().take(word.chars().count()).collect();
    if !prefix.eq_ignore_ascii_case(word) {
        return false;
    }

    match chars.next() {
        Some(c) if c.is_whitespace() => {}
        _ => return false,
    }

    let rest: String = chars.take(4).collect();
    rest.eq_ignore_ascii_case("date")
}

pub fn is_start_date_key(key: &str) -> bool {
    matches_date_key(key, "start")
}

pub fn is_end_date_key(key: &str) -> bool {
    matches_date_key(key, "end")
}

/// Loose truthiness of a feed value: null, false, 0, "", "0" and empty containers are absent
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty() && text != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Unix timestamp of a date meta value.
/// `Ok(None)` when the value is absent, `Err(())` when it is present but not a timestamp.
fn timestamp_value(value: &Value) -> Result<Option<i64>, ()> {
    if !is_truthy(value) {
        return Ok(None);
    }

    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|n| n.trunc() as i64))
            .map(Some)
            .ok_or(()),
        Value::String(text) => text.trim().parse::<i64>().map(Some).map_err(|_| ()),
        _ => Err(()),
    }
}

/// Text of a truthy scalar meta value
fn text_value(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }

    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Date of a date meta entry, recording a warning for unusable values
fn date_value(meta: &MetaEntry, tz: Tz, warnings: &mut Vec<MappingWarning>) -> Option<NaiveDate> {
    match timestamp_value(&meta.value) {
        Ok(Some(timestamp)) => {
            let date = local_date_from_timestamp(timestamp, tz);
            if date.is_none() {
                warnings.push(MappingWarning::InvalidDateValue {
                    key: meta.key.clone(),
                    value: meta.value.to_string(),
                });
            }
            date
        }
        Ok(None) => None,
        Err(()) => {
            warnings.push(MappingWarning::InvalidDateValue {
                key: meta.key.clone(),
                value: meta.value.to_string(),
            });
            None
        }
    }
}

/// Map a feed event onto the fields of a local event
pub fn map_remote_event(event: &RemoteEvent) -> MappedEvent {
    let mut warnings = Vec::new();

    // Dates are derived in the event's own timezone
    let tz = match parse_timezone(&event.date_tz) {
        Some(tz) => tz,
        None => {
            warnings.push(MappingWarning::UnknownTimezone(event.date_tz.clone()));
            Tz::UTC
        }
    };

    let mut fields = EventFields {
        title: event.title.as_str().to_string(),
        content: event.content.as_str().to_string(),
        status: EventStatus::Published,
        all_day: true,
        timezone: event.date_tz.clone(),
        start_date: None,
        end_date: None,
        url: None,
        venue: None,
    };

    for meta in &event.post_meta {
        if is_start_date_key(&meta.key) {
            fields.start_date = date_value(meta, tz, &mut warnings);
        } else if is_end_date_key(&meta.key) {
            if let Some(date) = date_value(meta, tz, &mut warnings) {
                fields.end_date = Some(date);
            }
        } else if meta.key == URL_KEY {
            if let Some(url) = text_value(&meta.value) {
                fields.url = Some(url);
            }
        } else if meta.key == VENUE_NAME_KEY {
            if let Some(name) = text_value(&meta.value) {
                fields.venue = Some(Venue { name });
            }
        }
    }

    match (fields.start_date, fields.end_date) {
        (Some(start), None) => fields.end_date = Some(start),
        (Some(start), Some(end)) if end < start => {
            warnings.push(MappingWarning::EndBeforeStart);
            fields.end_date = Some(start);
        }
        (None, Some(_)) => {
            warnings.push(MappingWarning::EndDateWithoutStart);
            fields.end_date = None;
        }
        _ => {}
    }

    // No start date means the event cannot be published
    if fields.start_date.is_none() {
        fields.status = EventStatus::Draft;
    }

    MappedEvent {
        remote_id: event.id,
        fields,
        warnings,
    }
}
