use async_trait::async_trait;

use crate::models::{NotificationChannel, NotificationError, NotificationEvent};

pub mod calendar;
pub mod dispatcher;
pub mod email;
pub mod slack;

/// One outbound side-effect channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> NotificationChannel;

    fn accepts(&self, event: &NotificationEvent) -> bool;

    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationError>;
}

/// Read the body of a non-2xx response into a [`NotificationError::Api`].
pub(crate) async fn ensure_success(
    channel: NotificationChannel,
    response: reqwest::Response,
) -> Result<reqwest::Response, NotificationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    tracing::error!("{} API returned {}: {}", channel, status, message);
    Err(NotificationError::Api {
        channel,
        status: status.as_u16(),
        message,
    })
}
