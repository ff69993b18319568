//! Line-oriented state machine that turns response bytes into reply deltas.
//!
//! [`DeltaParser`] is synchronous and owns no I/O: the async consumer pulls
//! chunks off the wire and [`feed`](DeltaParser::feed)s them in one by one.
//!
//! The text buffer always holds exactly the unconsumed suffix of everything
//! decoded so far. A data frame whose JSON does not parse yet stays at the
//! front of the buffer (the pending slot) and is retried when more bytes
//! arrive, this time also trying to extend it across the following
//! newlines so a payload with an embedded line break is recovered.

use tracing::{trace, warn};

use crate::decode::Utf8Decoder;
use crate::error::ServiceError;
use crate::stream::{DATA_PREFIX, DeltaPayload, DeltaSink, StreamFrame};

/// Bounds applied while parsing a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    /// Largest unconsumed frame tolerated before giving up.
    pub max_pending_bytes: usize,
}

impl ParserLimits {
    /// Default pending frame bound (64 KiB).
    pub const DEFAULT_MAX_PENDING_BYTES: usize = 64 * 1024;

    /// Limits with a custom pending frame bound.
    #[must_use]
    pub const fn new(max_pending_bytes: usize) -> Self {
        Self { max_pending_bytes }
    }
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_PENDING_BYTES)
    }
}

/// Whether the stream should keep being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Keep reading.
    Continue,
    /// The `[DONE]` sentinel was seen; stop reading.
    Done,
}

/// Incremental parser for one streamed assistant reply.
#[derive(Debug)]
pub struct DeltaParser {
    decoder: Utf8Decoder,
    buffer: String,
    accumulator: String,
    limits: ParserLimits,
    done: bool,
}

impl Default for DeltaParser {
    fn default() -> Self {
        Self::new(ParserLimits::default())
    }
}

impl DeltaParser {
    /// Create a parser with the given limits.
    #[must_use]
    pub const fn new(limits: ParserLimits) -> Self {
        Self {
            decoder: Utf8Decoder::new(),
            buffer: String::new(),
            accumulator: String::new(),
            limits,
            done: false,
        }
    }

    /// Feed the next chunk of response bytes.
    ///
    /// Every non-empty fragment resolved from this chunk is reported to
    /// `sink` before returning. After [`Progress::Done`] further input is
    /// ignored.
    pub fn feed<S>(&mut self, chunk: &[u8], sink: &mut S) -> Result<Progress, ServiceError>
    where
        S: DeltaSink + ?Sized,
    {
        if self.done {
            return Ok(Progress::Done);
        }

        let text = self.decoder.decode(chunk);
        self.buffer.push_str(&text);

        let mut consumed = 0;
        let progress = loop {
            let rest = &self.buffer[consumed..];
            let Some(newline) = rest.find('\n') else {
                break Progress::Continue;
            };

            match StreamFrame::classify(&rest[..newline]) {
                frame @ StreamFrame::Data(_) if frame.is_done() => {
                    consumed += newline + 1;
                    self.done = true;
                    break Progress::Done;
                }
                StreamFrame::Data(_) => {
                    let Some((payload, frame_len)) = resolve_data_frame(rest, newline) else {
                        trace!(pending = rest.len(), "data frame incomplete, waiting for more bytes");
                        break Progress::Continue;
                    };
                    consumed += frame_len;
                    if let Some(fragment) = payload.fragment()
                        && !fragment.is_empty()
                    {
                        self.accumulator.push_str(fragment);
                        sink.on_delta(fragment, &self.accumulator);
                    }
                }
                frame => {
                    trace!(?frame, "skipping non-data line");
                    consumed += newline + 1;
                }
            }
        };

        self.buffer.drain(..consumed);

        if progress == Progress::Continue && self.buffer.len() > self.limits.max_pending_bytes {
            return Err(ServiceError::protocol(format!(
                "stream frame exceeded {} bytes without becoming valid JSON",
                self.limits.max_pending_bytes
            )));
        }

        Ok(progress)
    }

    /// Close the parser at end of stream and return the full reply.
    ///
    /// An unterminated trailing line never completed and is dropped, as is
    /// a terminated frame that never became valid JSON.
    pub fn finish(mut self) -> String {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);
        if self.buffer.contains('\n') {
            warn!(
                bytes = self.buffer.len(),
                "stream ended with an unparseable data frame pending"
            );
        } else if !self.buffer.is_empty() {
            trace!(bytes = self.buffer.len(), "discarding unterminated trailing line");
        }
        self.accumulator
    }

    /// Reply text accumulated so far.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.accumulator
    }

    /// Returns `true` once the `[DONE]` sentinel has been seen.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Number of buffered bytes not yet consumed as a frame.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Parse the data frame at the start of `rest`, first line ending at `newline`.
///
/// Tries the first line alone, then the first line joined with each
/// following complete line in turn. Returns the payload and the number of
/// bytes it spans (trailing `\n` included), or `None` if no complete
/// prefix is valid JSON yet.
fn resolve_data_frame(rest: &str, newline: usize) -> Option<(DeltaPayload, usize)> {
    let mut end = newline;
    loop {
        let frame = &rest[..end];
        let frame = frame.strip_suffix('\r').unwrap_or(frame);
        let payload = frame.get(DATA_PREFIX.len()..).unwrap_or_default().trim();
        if let Ok(parsed) = DeltaPayload::parse(payload) {
            return Some((parsed, end + 1));
        }
        end += 1 + rest[end + 1..].find('\n')?;
    }
}
