//! Streaming types for chat replies.
//!
//! The chat endpoint answers with newline-delimited frames in the
//! server-sent-events style:
//!
//! ```text
//! : keep-alive
//!
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: [DONE]
//! ```
//!
//! [`StreamFrame`] classifies one such line, [`DeltaPayload`] reads the text
//! fragment out of a data frame, and [`DeltaSink`] is where the consumer
//! reports each fragment as it arrives.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::message::{Message, upsert_assistant};

/// Prefix of a data frame.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks the end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Marker that starts a comment line.
pub const COMMENT_MARKER: char = ':';

/// One decoded line of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFrame<'a> {
    /// Empty or whitespace-only line.
    Blank,
    /// `:`-prefixed comment, usually a keep-alive.
    Comment(&'a str),
    /// `data: ` frame; holds the trimmed payload.
    Data(&'a str),
    /// Anything else (`event:`, `id:`, `retry:` ...). Ignored.
    Unrecognized(&'a str),
}

impl<'a> StreamFrame<'a> {
    /// Classify a line taken from the buffer without its `\n`.
    ///
    /// A single trailing `\r` is stripped first.
    #[must_use]
    pub fn classify(line: &'a str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            Self::Blank
        } else if let Some(rest) = line.strip_prefix(COMMENT_MARKER) {
            Self::Comment(rest)
        } else if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
            Self::Data(payload.trim())
        } else {
            Self::Unrecognized(line)
        }
    }

    /// Returns `true` if this is the terminal `data: [DONE]` frame.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Data(payload) if *payload == DONE_SENTINEL)
    }
}

/// Parsed JSON payload of a data frame.
///
/// Only `choices[0].delta.content` carries meaning; the rest of the
/// document is kept but never inspected. Any syntactically valid JSON is
/// accepted, whatever its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaPayload(Value);

impl DeltaPayload {
    const FRAGMENT_POINTER: &'static str = "/choices/0/delta/content";

    /// Parse a frame payload.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload).map(Self)
    }

    /// The text fragment, if present and a string.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.0.pointer(Self::FRAGMENT_POINTER).and_then(Value::as_str)
    }

    /// The raw JSON document.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Event emitted on the channel returned by
/// [`Client::stream_chat_channel`](crate::Client::stream_chat_channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChatEvent {
    /// A new fragment arrived.
    Delta {
        /// The fragment itself.
        text: String,
        /// All text received so far in this reply.
        accumulated: String,
    },
    /// The reply finished normally.
    Completed {
        /// Full reply text.
        content: String,
    },
}

impl ChatEvent {
    /// Returns the fragment if this is a delta event.
    #[must_use]
    pub fn as_delta(&self) -> Option<&str> {
        match self {
            Self::Delta { text, .. } => Some(text),
            Self::Completed { .. } => None,
        }
    }
}

/// Receiver of incremental reply text.
///
/// `accumulated` always holds the full reply so far, `delta` included, so
/// sinks that render the whole message can replace rather than append.
pub trait DeltaSink {
    /// Called once per non-empty fragment, in arrival order.
    fn on_delta(&mut self, delta: &str, accumulated: &str);
}

impl<S: DeltaSink + ?Sized> DeltaSink for &mut S {
    fn on_delta(&mut self, delta: &str, accumulated: &str) {
        (**self).on_delta(delta, accumulated);
    }
}

/// The conversation itself: the trailing assistant message tracks the reply.
impl DeltaSink for Vec<Message> {
    fn on_delta(&mut self, _delta: &str, accumulated: &str) {
        upsert_assistant(self, accumulated);
    }
}

/// Forwards deltas as [`ChatEvent::Delta`]. A dropped receiver is ignored.
impl DeltaSink for mpsc::UnboundedSender<ChatEvent> {
    fn on_delta(&mut self, delta: &str, accumulated: &str) {
        let _ = self.send(ChatEvent::Delta {
            text: delta.to_owned(),
            accumulated: accumulated.to_owned(),
        });
    }
}

/// Adapts a closure `FnMut(delta, accumulated)` into a [`DeltaSink`].
pub struct FnSink<F>(pub F);

impl<F> fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}

impl<F: FnMut(&str, &str)> DeltaSink for FnSink<F> {
    fn on_delta(&mut self, delta: &str, accumulated: &str) {
        (self.0)(delta, accumulated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod classify {
        use super::*;

        #[test]
        fn blank_lines() {
            assert_eq!(StreamFrame::classify(""), StreamFrame::Blank);
            assert_eq!(StreamFrame::classify("\r"), StreamFrame::Blank);
            assert_eq!(StreamFrame::classify("   \t"), StreamFrame::Blank);
        }

        #[test]
        fn comments() {
            assert_eq!(
                StreamFrame::classify(": keepalive"),
                StreamFrame::Comment(" keepalive")
            );
            assert_eq!(StreamFrame::classify(":\r"), StreamFrame::Comment(""));
        }

        #[test]
        fn data_payload_is_trimmed() {
            assert_eq!(
                StreamFrame::classify("data:  {\"a\":1}  \r"),
                StreamFrame::Data("{\"a\":1}")
            );
        }

        #[test]
        fn data_without_space_is_unrecognized() {
            assert_eq!(
                StreamFrame::classify("data:{}"),
                StreamFrame::Unrecognized("data:{}")
            );
            assert!(matches!(
                StreamFrame::classify("event: message"),
                StreamFrame::Unrecognized(_)
            ));
        }

        #[test]
        fn only_one_carriage_return_is_stripped() {
            assert_eq!(
                StreamFrame::classify("id: 1\r\r"),
                StreamFrame::Unrecognized("id: 1\r")
            );
        }

        #[test]
        fn done_sentinel() {
            assert!(StreamFrame::classify("data: [DONE]").is_done());
            assert!(StreamFrame::classify("data: [DONE]  \r").is_done());
            assert!(!StreamFrame::classify("data: [DONE]x").is_done());
            assert!(!StreamFrame::classify(": [DONE]").is_done());
        }
    }

    mod payload {
        use super::*;

        #[test]
        fn extracts_fragment() {
            let payload =
                DeltaPayload::parse(r#"{"id":"1","choices":[{"index":0,"delta":{"content":"Hi"}}]}"#)
                    .expect("valid json");
            assert_eq!(payload.fragment(), Some("Hi"));
        }

        #[test]
        fn missing_fragment_is_none() {
            for json in [
                r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
                r#"{"choices":[]}"#,
                r#"{"usage":{"total_tokens":3}}"#,
                r#"{"choices":[{"delta":{"content":null}}]}"#,
                "42",
            ] {
                let payload = DeltaPayload::parse(json).expect("valid json");
                assert_eq!(payload.fragment(), None, "{json}");
            }
        }

        #[test]
        fn only_first_choice_counts() {
            let payload = DeltaPayload::parse(
                r#"{"choices":[{"delta":{}},{"delta":{"content":"ignored"}}]}"#,
            )
            .expect("valid json");
            assert_eq!(payload.fragment(), None);
        }

        #[test]
        fn truncated_json_fails() {
            assert!(DeltaPayload::parse(r#"{"choices":"#).is_err());
        }
    }

    mod sinks {
        use super::*;

        #[test]
        fn history_sink_accumulates_into_one_message() {
            let mut history = vec![Message::user("hi")];
            history.on_delta("He", "He");
            history.on_delta("llo", "Hello");
            assert_eq!(history.len(), 2);
            assert_eq!(history[1], Message::assistant("Hello"));
        }

        #[test]
        fn fn_sink_sees_every_delta() {
            let mut seen = Vec::new();
            {
                let mut sink = FnSink(|d: &str, _: &str| seen.push(d.to_owned()));
                sink.on_delta("a", "a");
                sink.on_delta("b", "ab");
            }
            assert_eq!(seen, ["a", "b"]);
        }

        #[test]
        fn channel_sink_ignores_closed_receiver() {
            let (mut tx, rx) = mpsc::unbounded_channel::<ChatEvent>();
            drop(rx);
            tx.on_delta("x", "x");
        }

        #[test]
        fn channel_sink_forwards_events() {
            let (mut tx, mut rx) = mpsc::unbounded_channel::<ChatEvent>();
            tx.on_delta("x", "x");
            let event = rx.try_recv().expect("event");
            assert_eq!(event.as_delta(), Some("x"));
        }
    }
}
