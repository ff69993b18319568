//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use hiresense::prelude::*;
//! ```

pub use crate::analysis::{AnalysisRequest, ResumeAnalysis};
pub use crate::client::{Client, consume_stream};
pub use crate::config::{ClientConfig, Endpoints};
pub use crate::error::{Error, Result, ServiceError, StatusWording};
pub use crate::message::{Message, Role, upsert_assistant};
pub use crate::notification::{
    EmailContent, NotificationData, NotificationKind, NotificationReceipt, NotificationRequest,
};
pub use crate::parser::{DeltaParser, ParserLimits, Progress};
pub use crate::stream::{ChatEvent, DeltaSink, FnSink};
