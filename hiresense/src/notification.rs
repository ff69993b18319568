//! Notification request types and email templates.
//!
//! The `send-notification` function emails candidates and recruiters when an
//! application changes state. [`EmailContent::render`] produces the same
//! subject and body the function sends, which the CLI uses for previews.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sender shown on every notification email.
pub const SENDER: &str = "HireSense AI <onboarding@resend.dev>";

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A candidate applied; sent to the recruiter.
    ApplicationReceived,
    /// The candidate was shortlisted.
    Shortlisted,
    /// An interview was scheduled.
    InterviewScheduled,
    /// Generic status change.
    StatusUpdate,
}

impl NotificationKind {
    /// All kinds, in pipeline order.
    pub const ALL: [Self; 4] = [
        Self::ApplicationReceived,
        Self::Shortlisted,
        Self::InterviewScheduled,
        Self::StatusUpdate,
    ];

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationReceived => "application_received",
            Self::Shortlisted => "shortlisted",
            Self::InterviewScheduled => "interview_scheduled",
            Self::StatusUpdate => "status_update",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(Self::as_str).collect();
                format!("unknown notification kind '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// Template variables. Every field is optional; missing ones render empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Candidate's display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    /// Job title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    /// Hiring company.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Interview date and time, free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<String>,
    /// New application status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Extra message from the recruiter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body for the notification function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    /// Notification kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Where the email goes.
    pub recipient_email: String,
    /// Recipient's user id, for the delivery log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_user_id: Option<String>,
    /// Template variables.
    pub data: NotificationData,
}

impl NotificationRequest {
    /// Create a request with empty template data.
    #[must_use]
    pub fn new(kind: NotificationKind, recipient_email: impl Into<String>) -> Self {
        Self {
            kind,
            recipient_email: recipient_email.into(),
            recipient_user_id: None,
            data: NotificationData::default(),
        }
    }

    /// Attach template data.
    #[must_use]
    pub fn with_data(mut self, data: NotificationData) -> Self {
        self.data = data;
        self
    }

    /// Attach the recipient's user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.recipient_user_id = Some(user_id.into());
        self
    }

    /// Render the email this request will produce.
    #[must_use]
    pub fn render(&self) -> EmailContent {
        EmailContent::render(self.kind, &self.data)
    }
}

/// Response of the notification function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    /// Whether the email was accepted for delivery.
    pub success: bool,
    /// Provider message id.
    #[serde(default)]
    pub id: Option<String>,
}

/// Rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    /// Subject line (plain text).
    pub subject: String,
    /// HTML body.
    pub html: String,
}

impl EmailContent {
    /// Render the email for `kind`. Interpolated values are HTML-escaped in the body.
    #[must_use]
    pub fn render(kind: NotificationKind, data: &NotificationData) -> Self {
        let field = |v: &Option<String>| v.as_deref().unwrap_or_default().to_owned();
        let html = |v: &Option<String>| escape_html(v.as_deref().unwrap_or_default());

        let candidate = field(&data.candidate_name);
        let job = field(&data.job_title);
        let company = field(&data.company_name);

        match kind {
            NotificationKind::ApplicationReceived => Self {
                subject: format!("New Application: {candidate} for {job}"),
                html: format!(
                    "<h1>New Application Received</h1>\n\
                     <p><strong>{}</strong> has applied for the <strong>{}</strong> position.</p>\n\
                     <p>Log in to HireSense AI to review their application and resume.</p>\n\
                     <p>Best regards,<br/>HireSense AI Team</p>",
                    html(&data.candidate_name),
                    html(&data.job_title),
                ),
            },
            NotificationKind::Shortlisted => Self {
                subject: format!("Great news! You've been shortlisted for {job}"),
                html: format!(
                    "<h1>Congratulations!</h1>\n\
                     <p>You've been shortlisted for the <strong>{}</strong> position at <strong>{}</strong>.</p>\n\
                     <p>The hiring team will reach out to you soon with next steps.</p>\n\
                     <p>Best of luck!<br/>HireSense AI Team</p>",
                    html(&data.job_title),
                    html(&data.company_name),
                ),
            },
            NotificationKind::InterviewScheduled => Self {
                subject: format!("Interview Scheduled: {job} at {company}"),
                html: format!(
                    "<h1>Interview Scheduled</h1>\n\
                     <p>Your interview for <strong>{}</strong> at <strong>{}</strong> has been scheduled.</p>\n\
                     <p><strong>Date &amp; Time:</strong> {}</p>\n\
                     <p>Please ensure you're prepared and join on time.</p>\n\
                     <p>Good luck!<br/>HireSense AI Team</p>",
                    html(&data.job_title),
                    html(&data.company_name),
                    html(&data.interview_date),
                ),
            },
            NotificationKind::StatusUpdate => {
                let mut body = format!(
                    "<h1>Application Status Update</h1>\n\
                     <p>Your application for <strong>{}</strong> at <strong>{}</strong> has been updated.</p>\n\
                     <p><strong>New Status:</strong> {}</p>\n",
                    html(&data.job_title),
                    html(&data.company_name),
                    html(&data.status),
                );
                if let Some(message) = data.message.as_deref().filter(|m| !m.is_empty()) {
                    body.push_str(&format!(
                        "<p><strong>Message:</strong> {}</p>\n",
                        escape_html(message)
                    ));
                }
                body.push_str("<p>Best regards,<br/>HireSense AI Team</p>");
                Self {
                    subject: format!("Application Update: {job}"),
                    html: body,
                }
            }
        }
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
