//! Notification calls.

use tracing::{debug, info};

use crate::error::{Result, ServiceError, StatusWording};
use crate::notification::{NotificationReceipt, NotificationRequest};

use super::Client;

impl Client {
    /// Ask the notification function to email `request.recipient_email`.
    pub async fn send_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<NotificationReceipt> {
        let email = request.recipient_email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::request_failed(format!(
                "Invalid recipient email '{}'",
                request.recipient_email
            ))
            .into());
        }

        let url = &self.endpoints.notify;
        debug!(url = %url, kind = %request.kind, "sending notification request");

        let http_request = self.post_with_timeout(url).json(request);
        let receipt: NotificationReceipt =
            Self::call_json(http_request, &StatusWording::NOTIFICATION).await?;

        if !receipt.success {
            let message = StatusWording::NOTIFICATION.fallback;
            return Err(ServiceError::request_failed(message).into());
        }

        info!(kind = %request.kind, id = ?receipt.id, "notification sent");
        Ok(receipt)
    }
}
