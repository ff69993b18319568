//! HireSense - client for the HireSense AI recruiting functions
//!
//! The centerpiece is a streaming chat consumer: it sends a conversation to
//! the chat function, reads the server-sent-events style reply as it
//! arrives, and keeps the conversation's trailing assistant message in sync
//! with the text received so far. Resume analysis and notification emails
//! are plain JSON calls on the same [`Client`].
//!
//! The line-splitting state machine ([`DeltaParser`]) is synchronous and
//! knows nothing about HTTP, so it can be driven from any byte source.

pub mod analysis;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod message;
pub mod notification;
pub mod parser;
pub mod prelude;
pub mod stream;

pub use client::{Client, consume_stream};
pub use config::ClientConfig;
pub use error::{Error, Result, ServiceError, StatusWording};
pub use message::{Message, Role};
pub use parser::{DeltaParser, ParserLimits};
pub use stream::{ChatEvent, DeltaSink, FnSink};
