//! Stream decoder: raw named events from the live channel into typed messages.
//!
//! The monitor renders its payloads as Python literals, so strings arrive
//! single-quoted and booleans as `True`/`False`. [`normalize_quotes`] rewrites
//! such text into JSON before it is handed to serde; nothing past this module
//! sees the original quoting.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::DecodeError;
use crate::score::{PenaltyKind, ScoreEvent};

/// Named channels carried by the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Status,
    Error,
}

impl EventKind {
    pub fn from_wire(name: &str) -> Result<Self, DecodeError> {
        match name {
            "status" | "status_msg" => Ok(EventKind::Status),
            "error" | "error_msg" => Ok(EventKind::Error),
            other => Err(DecodeError::UnknownEvent(other.to_string())),
        }
    }
}

/// A decoded live message.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Status(ScoreEvent),
    /// Diagnostic reported by the monitor; never fed to the state machine.
    Error(String),
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    overall_score: f64,
    accumulated_score: f64,
    #[serde(default, alias = "penalty_factors")]
    penalty_factor: Vec<PenaltyKind>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(rename = "type")]
    kind: String,
    msg: String,
}

pub fn decode(event_name: &str, data: &str) -> Result<StreamMessage, DecodeError> {
    match EventKind::from_wire(event_name)? {
        EventKind::Status => decode_status(data).map(StreamMessage::Status),
        EventKind::Error => Ok(StreamMessage::Error(decode_error(data))),
    }
}

pub fn decode_status(data: &str) -> Result<ScoreEvent, DecodeError> {
    let payload: StatusPayload = serde_json::from_str(&normalize_quotes(data))?;

    if !payload.overall_score.is_finite() || !(0.0..=100.0).contains(&payload.overall_score) {
        return Err(DecodeError::OutOfRange {
            field: "overall_score",
            value: payload.overall_score,
        });
    }
    if !payload.accumulated_score.is_finite() || payload.accumulated_score < 0.0 {
        return Err(DecodeError::OutOfRange {
            field: "accumulated_score",
            value: payload.accumulated_score,
        });
    }

    Ok(ScoreEvent {
        overall_score: payload.overall_score,
        accumulated_score: payload.accumulated_score,
        penalties: payload.penalty_factor.into_iter().collect::<BTreeSet<_>>(),
    })
}

/// Error payloads degrade to their raw text when they are not a `{type, msg}` mapping.
pub fn decode_error(data: &str) -> String {
    match serde_json::from_str::<ErrorPayload>(&normalize_quotes(data)) {
        Ok(payload) => format!("{}: {}", payload.kind, payload.msg),
        Err(_) => data.trim().to_string(),
    }
}

/// Rewrite a Python-literal mapping into JSON.
///
/// Single-quoted strings become double-quoted (escaping any `"` they contain),
/// double-quoted strings are kept, and the bare keywords `True`, `False` and
/// `None` become `true`, `false` and `null`. Text that is already JSON passes
/// through unchanged.
pub fn normalize_quotes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => match c {
                '\\' => match chars.next() {
                    Some('\'') => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                c if c == q => {
                    out.push('"');
                    quote = None;
                }
                '"' => out.push_str("\\\""),
                c => out.push(c),
            },
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    out.push('"');
                }
                c if c.is_ascii_alphabetic() => {
                    let word = take_word(c, &mut chars);
                    out.push_str(match word.as_str() {
                        "True" => "true",
                        "False" => "false",
                        "None" => "null",
                        other => other,
                    });
                }
                c => out.push(c),
            },
        }
    }

    out
}

fn take_word(first: char, chars: &mut Peekable<Chars<'_>>) -> String {
    let mut word = String::from(first);
    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn single_quoted_payload_decodes_like_json() {
        let python = "{'overall_score': 95.5, 'penalty_factor': ['IS_DROWSY'], 'accumulated_score': 1200.0}";
        let json = r#"{"overall_score": 95.5, "penalty_factor": ["IS_DROWSY"], "accumulated_score": 1200.0}"#;

        let a = decode("status", python).unwrap();
        let b = decode("status", json).unwrap();
        assert_eq!(a, b);
        assert_matches!(a, StreamMessage::Status(ev) if ev.penalties.contains(&PenaltyKind::Drowsy));
    }

    #[test]
    fn legacy_event_names_are_accepted() {
        assert_eq!(EventKind::from_wire("status_msg").unwrap(), EventKind::Status);
        assert_eq!(EventKind::from_wire("error_msg").unwrap(), EventKind::Error);
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        assert_matches!(decode("heartbeat", "{}"), Err(DecodeError::UnknownEvent(name)) if name == "heartbeat");
    }

    #[test]
    fn missing_field_is_malformed() {
        assert_matches!(
            decode("status", "{'overall_score': 50}"),
            Err(DecodeError::Malformed(_))
        );
    }

    #[test]
    fn unknown_penalty_rejects_event() {
        let data = "{'overall_score': 50, 'accumulated_score': 10, 'penalty_factor': ['IS_SNEEZING']}";
        assert_matches!(decode("status", data), Err(DecodeError::Malformed(_)));
    }

    #[test]
    fn missing_penalties_default_to_empty() {
        let ev = decode_status("{'overall_score': 50, 'accumulated_score': 10}").unwrap();
        assert!(ev.penalties.is_empty());
    }

    #[test]
    fn out_of_range_scores_rejected() {
        assert_matches!(
            decode_status("{'overall_score': 101, 'accumulated_score': 10}"),
            Err(DecodeError::OutOfRange { field: "overall_score", .. })
        );
        assert_matches!(
            decode_status("{'overall_score': 10, 'accumulated_score': -1}"),
            Err(DecodeError::OutOfRange { field: "accumulated_score", .. })
        );
    }

    #[test]
    fn error_payload_formats_type_and_message() {
        let msg = decode("error", "{'type': 'UNKNOWN', 'msg': \"camera can't be opened\"}").unwrap();
        assert_eq!(
            msg,
            StreamMessage::Error("UNKNOWN: camera can't be opened".to_string())
        );
    }

    #[test]
    fn error_payload_falls_back_to_raw_text() {
        let msg = decode("error", "  no face detected \n").unwrap();
        assert_eq!(msg, StreamMessage::Error("no face detected".to_string()));
    }

    #[test]
    fn normalize_keeps_apostrophes_and_maps_keywords() {
        assert_eq!(
            normalize_quotes("{'a': \"it's\", 'b': True, 'c': None, 'd': False}"),
            r#"{"a": "it's", "b": true, "c": null, "d": false}"#
        );
    }

    #[test]
    fn normalize_escapes_double_quotes_inside_single_quoted() {
        assert_eq!(normalize_quotes(r#"{'m': 'say "hi"'}"#), r#"{"m": "say \"hi\""}"#);
    }

    #[test]
    fn normalize_leaves_json_untouched() {
        let json = r#"{"x": [1, 2.5e3, true], "y": "True"}"#;
        assert_eq!(normalize_quotes(json), json);
    }
}
