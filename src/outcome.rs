//! Outcome of a single command invocation.
//!
//! An `Outcome` is produced once per invocation and consumed exactly once by
//! the results listener. It serializes to one JSON object per line for the
//! optional results file, omitting empty fields.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FlakrError, Result};

/// The result record of one command invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Captured standard output
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,

    /// Captured standard error
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,

    /// Process exit code (-1 if the command could not be spawned)
    pub code: i32,

    /// Error message for a non-zero exit or a spawn failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Elapsed wall-clock time of the invocation
    #[serde(with = "duration_string")]
    pub duration: Duration,
}

impl Outcome {
    /// Successful iff the command exited 0 and no execution error occurred.
    ///
    /// This single rule drives both statistics and stop-on-failure.
    pub fn is_success(&self) -> bool {
        self.code == 0 && self.error.is_none()
    }

    /// Inverse of [`is_success`](Self::is_success).
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Code: {}\nError: {}\n\nSTDOUT:\n{}\n\nSTDERR:\n{}\n",
            self.code,
            self.error.as_deref().unwrap_or("<none>"),
            self.stdout,
            self.stderr,
        )
    }
}

/// Render a duration as a compact human-readable string, e.g. `"1.234s"`,
/// `"12.5ms"`, `"950µs"`. Precision is three fractional digits with trailing
/// zeros trimmed.
pub fn format_duration(dur: Duration) -> String {
    let nanos = dur.as_nanos();
    if nanos >= 1_000_000_000 {
        format!("{}s", trim_fraction(dur.as_secs_f64()))
    } else if nanos >= 1_000_000 {
        format!("{}ms", trim_fraction(nanos as f64 / 1_000_000.0))
    } else if nanos >= 1_000 {
        format!("{}µs", trim_fraction(nanos as f64 / 1_000.0))
    } else {
        format!("{}ns", nanos)
    }
}

fn trim_fraction(value: f64) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

/// Parse a duration string produced by [`format_duration`].
pub fn parse_duration_str(input: &str) -> Result<Duration> {
    let input = input.trim();
    let (number, scale) = if let Some(n) = input.strip_suffix("ms") {
        (n, 1e-3)
    } else if let Some(n) = input.strip_suffix("µs").or_else(|| input.strip_suffix("us")) {
        (n, 1e-6)
    } else if let Some(n) = input.strip_suffix("ns") {
        (n, 1e-9)
    } else if let Some(n) = input.strip_suffix('s') {
        (n, 1.0)
    } else {
        return Err(FlakrError::InvalidDuration {
            input: input.to_string(),
            reason: "missing duration unit".to_string(),
        });
    };

    let value: f64 = number.parse().map_err(|_| FlakrError::InvalidDuration {
        input: input.to_string(),
        reason: "invalid number".to_string(),
    })?;
    if value < 0.0 {
        return Err(FlakrError::InvalidDuration {
            input: input.to_string(),
            reason: "duration must not be negative".to_string(),
        });
    }
    Ok(Duration::from_secs_f64(value * scale))
}

mod duration_string {
    use super::{format_duration, parse_duration_str};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(dur: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*dur))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_duration_str(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Outcome {
        Outcome {
            stdout: "hello\n".to_string(),
            stderr: String::new(),
            code: 0,
            error: None,
            duration: Duration::from_millis(1234),
        }
    }

    #[test]
    fn test_success_classification() {
        assert!(sample().is_success());

        let failed = Outcome { code: 1, error: Some("exit status 1".into()), ..sample() };
        assert!(failed.is_failure());

        // Any non-zero code is a failure, not just 1
        let failed = Outcome { code: 2, error: Some("exit status 2".into()), ..sample() };
        assert!(failed.is_failure());
        let failed = Outcome { code: 127, error: Some("exit status 127".into()), ..sample() };
        assert!(failed.is_failure());
        let failed = Outcome { code: -1, error: Some("no such file".into()), ..sample() };
        assert!(failed.is_failure());
    }

    #[test]
    fn test_spawn_error_with_zero_code_is_failure() {
        let outcome = Outcome { code: 0, error: Some("spawn failed".into()), ..sample() };
        assert!(outcome.is_failure());
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let outcome = Outcome {
            stdout: String::new(),
            stderr: String::new(),
            code: 0,
            error: None,
            duration: Duration::from_secs(2),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"code":0,"duration":"2s"}"#);
    }

    #[test]
    fn test_serialize_full_record() {
        let outcome = Outcome {
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            code: 1,
            error: Some("exit status 1".to_string()),
            duration: Duration::from_millis(1234),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(
            json,
            r#"{"stdout":"out","stderr":"err","code":1,"error":"exit status 1","duration":"1.234s"}"#
        );
    }

    #[test]
    fn test_json_roundtrip_preserves_fields() {
        let outcome = Outcome {
            stdout: "line one\nline two\n".to_string(),
            stderr: "warning\n".to_string(),
            code: 2,
            error: Some("exit status 2".to_string()),
            duration: Duration::from_micros(1_234_567),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.stdout, outcome.stdout);
        assert_eq!(parsed.stderr, outcome.stderr);
        assert_eq!(parsed.code, outcome.code);
        assert_eq!(parsed.error, outcome.error);
        // Duration survives within formatting precision (1ms at this scale)
        let diff = parsed.duration.abs_diff(outcome.duration);
        assert!(diff <= Duration::from_millis(1), "diff was {diff:?}");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration(Duration::from_millis(1234)), "1.234s");
        assert_eq!(format_duration(Duration::from_millis(90_500)), "90.5s");
        assert_eq!(format_duration(Duration::from_micros(12_500)), "12.5ms");
        assert_eq!(format_duration(Duration::from_micros(950)), "950µs");
        assert_eq!(format_duration(Duration::from_nanos(17)), "17ns");
        assert_eq!(format_duration(Duration::ZERO), "0ns");
    }

    #[test]
    fn test_parse_duration_str() {
        assert_eq!(parse_duration_str("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration_str("1.234s").unwrap(), Duration::from_millis(1234));
        assert_eq!(parse_duration_str("12.5ms").unwrap(), Duration::from_micros(12_500));
        assert_eq!(parse_duration_str("950µs").unwrap(), Duration::from_micros(950));
        assert_eq!(parse_duration_str("950us").unwrap(), Duration::from_micros(950));
        assert_eq!(parse_duration_str("17ns").unwrap(), Duration::from_nanos(17));
    }

    #[test]
    fn test_parse_duration_str_rejects_garbage() {
        assert!(parse_duration_str("").is_err());
        assert!(parse_duration_str("12").is_err());
        assert!(parse_duration_str("abcs").is_err());
        assert!(parse_duration_str("-1s").is_err());
    }

    #[test]
    fn test_display_includes_streams() {
        let outcome = Outcome {
            stdout: "output".to_string(),
            stderr: "problem".to_string(),
            code: 1,
            error: Some("exit status 1".to_string()),
            duration: Duration::from_secs(1),
        };
        let rendered = outcome.to_string();
        assert!(rendered.contains("Code: 1"));
        assert!(rendered.contains("output"));
        assert!(rendered.contains("problem"));
    }
}
