// libs/notification-cell/src/services/dispatcher.rs
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::models::{DeliveryOutcome, DispatchReport, NotificationChannel, NotificationError, NotificationEvent};
use crate::services::{
    calendar::CalendarNotifier, email::EmailNotifier, slack::SlackNotifier, Notifier,
};

/// Fans an event out to every notifier that accepts it.
///
/// Dispatch never fails: each notifier runs under its own deadline and a
/// failure only marks that channel as undelivered in the report.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>, timeout: Duration) -> Self {
        Self { notifiers, timeout }
    }

    /// Build every notifier whose credentials are present.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

        match CalendarNotifier::from_config(config) {
            Some(calendar) => notifiers.push(Arc::new(calendar)),
            None => info!("Calendar notifications disabled"),
        }
        match EmailNotifier::from_config(config) {
            Some(email) => notifiers.push(Arc::new(email)),
            None => info!("Email notifications disabled"),
        }
        match SlackNotifier::from_config(config) {
            Some(slack) => notifiers.push(Arc::new(slack)),
            None => info!("Slack notifications disabled"),
        }

        Self::new(notifiers, config.notify_timeout)
    }

    pub fn disabled() -> Self {
        Self::new(Vec::new(), Duration::from_secs(1))
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.notifiers.iter().map(|notifier| notifier.channel()).collect()
    }

    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchReport {
        let accepting: Vec<&Arc<dyn Notifier>> = self
            .notifiers
            .iter()
            .filter(|notifier| notifier.accepts(event))
            .collect();

        if accepting.is_empty() {
            debug!("No notifier accepts {} events", event.kind());
            return DispatchReport::default();
        }

        let deliveries = accepting.into_iter().map(|notifier| async move {
            let channel = notifier.channel();
            let result = match timeout(self.timeout, notifier.notify(event)).await {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout(channel)),
            };

            match result {
                Ok(()) => DeliveryOutcome {
                    channel,
                    delivered: true,
                    detail: None,
                },
                Err(e) => {
                    warn!("{} notification for {} failed: {}", channel, event.kind(), e);
                    DeliveryOutcome {
                        channel,
                        delivered: false,
                        detail: Some(e.to_string()),
                    }
                }
            }
        });

        DispatchReport {
            outcomes: join_all(deliveries).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared_utils::test_utils::TestConfig;

    struct StaticNotifier {
        channel: NotificationChannel,
        fail: bool,
        delay: Duration,
    }

    #[async_trait]
    impl Notifier for StaticNotifier {
        fn channel(&self) -> NotificationChannel {
            self.channel
        }

        fn accepts(&self, event: &NotificationEvent) -> bool {
            match self.channel {
                NotificationChannel::Slack => matches!(event, NotificationEvent::SummaryReport { .. }),
                _ => matches!(event, NotificationEvent::AppointmentBooked { .. }),
            }
        }

        async fn notify(&self, _event: &NotificationEvent) -> Result<(), NotificationError> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(NotificationError::NotConfigured(self.channel))
            } else {
                Ok(())
            }
        }
    }

    fn notifier(channel: NotificationChannel, fail: bool, delay_ms: u64) -> Arc<dyn Notifier> {
        Arc::new(StaticNotifier {
            channel,
            fail,
            delay: Duration::from_millis(delay_ms),
        })
    }

    fn summary() -> NotificationEvent {
        NotificationEvent::SummaryReport {
            title: "Doctor Summary Report".to_string(),
            body: "nothing to report".to_string(),
        }
    }

    #[tokio::test]
    async fn test_only_accepting_notifiers_run() {
        let dispatcher = NotificationDispatcher::new(
            vec![
                notifier(NotificationChannel::Calendar, false, 0),
                notifier(NotificationChannel::Slack, false, 0),
            ],
            Duration::from_secs(1),
        );

        let report = dispatcher.dispatch(&summary()).await;
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.delivered(NotificationChannel::Slack));
        assert!(!report.attempted(NotificationChannel::Calendar));
    }

    #[tokio::test]
    async fn test_failures_and_timeouts_are_reported_not_raised() {
        let dispatcher = NotificationDispatcher::new(
            vec![
                notifier(NotificationChannel::Slack, true, 0),
                notifier(NotificationChannel::Slack, false, 500),
            ],
            Duration::from_millis(50),
        );

        let report = dispatcher.dispatch(&summary()).await;
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes.iter().all(|o| !o.delivered));
        assert!(report.outcomes[1].detail.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_from_config_skips_unconfigured_channels() {
        let mut config = TestConfig::default().to_app_config();
        config.slack_bot_token.clear();

        let channels = NotificationDispatcher::from_config(&config).channels();
        assert_eq!(channels, vec![NotificationChannel::Calendar, NotificationChannel::Email]);

        assert!(NotificationDispatcher::disabled().channels().is_empty());
    }
}
