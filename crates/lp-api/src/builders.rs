//! Builder-queue telemetry payloads.
//!
//! `getBuildQueueSizes` reports, per builder pool and architecture, the
//! number of queued jobs and the summed duration of those jobs. The
//! duration arrives either as a numeric seconds value or as the
//! timedelta string form `[D day[s], ]H:MM:SS[.ffffff]`, so decoding
//! accepts both.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Response of `ws.op=getBuildQueueSizes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildQueueSizes {
    /// Virtualized pool, keyed by architecture.
    #[serde(default)]
    pub virt: HashMap<String, QueueSlot>,

    /// Non-virtualized pool, keyed by architecture.
    #[serde(default)]
    pub nonvirt: HashMap<String, QueueSlot>,
}

/// One `[pending_jobs, total_duration]` pair from the queue-size map.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSlot(pub u64, pub Option<QueueDuration>);

impl QueueSlot {
    pub fn pending_jobs(&self) -> u64 {
        self.0
    }

    pub fn duration(&self) -> Option<Duration> {
        self.1.map(|d| d.0)
    }
}

/// A duration as serialized for queue telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueDuration(pub Duration);

impl<'de> Deserialize<'de> for QueueDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = QueueDuration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("seconds or a [D day[s], ]H:MM:SS[.ffffff] string")
            }

            fn visit_f64<E: de::Error>(self, secs: f64) -> Result<Self::Value, E> {
                if !secs.is_finite() || secs < 0.0 {
                    return Err(E::custom(format!("invalid duration seconds: {secs}")));
                }
                Ok(QueueDuration(Duration::from_secs_f64(secs)))
            }

            fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Self::Value, E> {
                Ok(QueueDuration(Duration::from_secs(secs)))
            }

            fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Self::Value, E> {
                u64::try_from(secs)
                    .map(|s| QueueDuration(Duration::from_secs(s)))
                    .map_err(|_| E::custom(format!("negative duration: {secs}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                parse_duration(value)
                    .map(QueueDuration)
                    .ok_or_else(|| E::custom(format!("unparseable duration '{value}'")))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

impl Serialize for QueueDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(self.0))
    }
}

/// Parse the timedelta string form `[D day[s], ]H:MM:SS[.ffffff]`.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let (days, clock) = match value.split_once(", ") {
        Some((day_part, rest)) => {
            let days = day_part.split_whitespace().next()?.parse::<u64>().ok()?;
            (days, rest)
        }
        None => (0, value),
    };

    let mut parts = clock.split(':');
    let hours = parts.next()?.trim().parse::<u64>().ok()?;
    let minutes = parts.next()?.parse::<u64>().ok()?;
    let second_part = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (seconds, micros) = match second_part.split_once('.') {
        Some((whole, frac)) => {
            let whole = whole.parse::<u64>().ok()?;
            let frac = if frac.len() > 6 { &frac[..6] } else { frac };
            let scale = 10u64.pow((6 - frac.len()) as u32);
            (whole, frac.parse::<u64>().ok()? * scale)
        }
        None => (second_part.parse::<u64>().ok()?, 0),
    };
    if seconds >= 60 {
        return None;
    }

    let total = days * 86_400 + hours * 3_600 + minutes * 60 + seconds;
    Some(Duration::from_secs(total) + Duration::from_micros(micros))
}

/// Render a duration back into the `H:MM:SS` clock form.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}:{:02}", total / 3_600, total % 3_600 / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_form() {
        assert_eq!(parse_duration("0:06:00"), Some(Duration::from_secs(360)));
        assert_eq!(
            parse_duration("2:03:04.500000"),
            Some(Duration::from_secs(7384) + Duration::from_millis(500))
        );
    }

    #[test]
    fn parses_day_prefix() {
        assert_eq!(
            parse_duration("1 day, 0:00:30"),
            Some(Duration::from_secs(86_430))
        );
        assert_eq!(
            parse_duration("2 days, 1:00:00"),
            Some(Duration::from_secs(2 * 86_400 + 3_600))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("0:99:00"), None);
        assert_eq!(parse_duration("1:2"), None);
    }

    #[test]
    fn formats_clock_form() {
        assert_eq!(format_duration(Duration::from_secs(360)), "0:06:00");
        assert_eq!(format_duration(Duration::from_secs(7384)), "2:03:04");
    }

    #[test]
    fn queue_sizes_decode_string_durations() {
        let sizes: BuildQueueSizes = serde_json::from_str(
            r#"{"virt": {"amd64": [4, "0:20:00"], "armhf": [0, null]}, "nonvirt": {}}"#,
        )
        .unwrap();
        let slot = &sizes.virt["amd64"];
        assert_eq!(slot.pending_jobs(), 4);
        assert_eq!(slot.duration(), Some(Duration::from_secs(1200)));
        assert_eq!(sizes.virt["armhf"].duration(), None);
    }

    #[test]
    fn queue_sizes_decode_numeric_durations() {
        let sizes: BuildQueueSizes =
            serde_json::from_str(r#"{"virt": {"arm64": [2, 474.5]}}"#).unwrap();
        assert_eq!(
            sizes.virt["arm64"].duration(),
            Some(Duration::from_secs_f64(474.5))
        );
    }
}
