// Severity-gated fan-out of notifications to contact channels.
//
// Low severity never leaves the process. Medium goes out on WhatsApp, high
// additionally on SMS. Every send is attempted once and on its own.

use std::sync::Arc;

use async_trait::async_trait;

use super::model::{Channel, Contact, ContactDirectory};
use crate::core::alerts::model::{Notification, Severity};
use crate::core::error::TransportError;

pub const URGENT_PREFIX: &str = "🚨 URGENTE: ";

/// Delivery mechanism for external channels.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn send_whatsapp(&self, phone: &str, text: &str) -> Result<(), TransportError>;

    async fn send_sms(&self, phone: &str, text: &str) -> Result<(), TransportError>;
}

/// Transport that only logs what it would send.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl ChannelTransport for LogTransport {
    async fn send_whatsapp(&self, phone: &str, text: &str) -> Result<(), TransportError> {
        log::info!("Sending WhatsApp to {}: {}", phone, text);
        Ok(())
    }

    async fn send_sms(&self, phone: &str, text: &str) -> Result<(), TransportError> {
        log::info!("Sending SMS to {}: {}", phone, text);
        Ok(())
    }
}

/// Outcome of one contact/channel send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    pub contact: String,
    pub channel: Channel,
    pub outcome: Result<(), TransportError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempts: Vec<DeliveryAttempt>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.attempts.iter().filter(|a| a.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.iter().filter(|a| a.outcome.is_err()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

/// Text sent to contacts for a notification.
pub fn compose_message(notification: &Notification) -> String {
    let prefix = if notification.severity() == Severity::High {
        URGENT_PREFIX
    } else {
        ""
    };
    format!("{}{}\n{}", prefix, notification.title(), notification.message())
}

pub struct NotificationRouter {
    directory: ContactDirectory,
    transport: Arc<dyn ChannelTransport>,
}

impl NotificationRouter {
    pub fn new(directory: ContactDirectory, transport: Arc<dyn ChannelTransport>) -> Self {
        Self {
            directory,
            transport,
        }
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    pub fn monitored_contact(&self) -> Option<&Contact> {
        self.directory.monitored_contact()
    }

    pub fn caregiver_contact(&self) -> Option<&Contact> {
        self.directory.caregiver_contact()
    }

    /// Channels a contact is sent on for a given severity, in send order.
    pub fn channels_for(contact: &Contact, severity: Severity) -> Vec<Channel> {
        let mut channels = Vec::new();
        if severity == Severity::Low {
            return channels;
        }
        if contact.supports(Channel::Whatsapp) {
            channels.push(Channel::Whatsapp);
        }
        if severity == Severity::High && contact.supports(Channel::Sms) {
            channels.push(Channel::Sms);
        }
        channels
    }

    /// Sends the notification to every contact on its eligible channels.
    /// Failures are logged and recorded; they never stop the remaining sends.
    pub async fn notify_contacts(&self, notification: &Notification) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        if notification.severity() == Severity::Low {
            log::debug!(
                "Not routing low severity notification {} to contacts",
                notification.id()
            );
            return report;
        }

        let text = compose_message(notification);

        for contact in self.directory.contacts() {
            for channel in Self::channels_for(contact, notification.severity()) {
                let outcome = self.send(channel, &contact.phone, &text).await;
                match &outcome {
                    Ok(()) => log::debug!(
                        "Sent {} notification {} to {} via {}",
                        notification.severity().as_str(),
                        notification.id(),
                        contact.name,
                        channel
                    ),
                    Err(e) => log::warn!(
                        "Failed to notify {} via {}: {}",
                        contact.name,
                        channel,
                        e
                    ),
                }
                report.attempts.push(DeliveryAttempt {
                    contact: contact.name.clone(),
                    channel,
                    outcome,
                });
            }
        }

        report
    }

    async fn send(&self, channel: Channel, phone: &str, text: &str) -> Result<(), TransportError> {
        match channel {
            Channel::Whatsapp => self.transport.send_whatsapp(phone, text).await,
            Channel::Sms => self.transport.send_sms(phone, text).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::model::NotificationKind;
    use crate::core::test_support::RecordingTransport;
    use chrono::Utc;

    fn notification(severity: Severity) -> Notification {
        Notification::new(
            NotificationKind::VitalSigns,
            severity,
            "Title",
            "Body",
            Utc::now(),
        )
    }

    fn router(transport: Arc<RecordingTransport>) -> NotificationRouter {
        NotificationRouter::new(ContactDirectory::default(), transport)
    }

    #[test]
    fn test_message_prefix_only_for_high() {
        assert_eq!(
            compose_message(&notification(Severity::High)),
            "🚨 URGENTE: Title\nBody"
        );
        assert_eq!(compose_message(&notification(Severity::Medium)), "Title\nBody");
        assert_eq!(compose_message(&notification(Severity::Low)), "Title\nBody");
    }

    #[tokio::test]
    async fn test_low_severity_is_never_routed() {
        let transport = Arc::new(RecordingTransport::default());
        let report = router(transport.clone())
            .notify_contacts(&notification(Severity::Low))
            .await;
        assert!(report.is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_medium_goes_to_whatsapp_only() {
        let transport = Arc::new(RecordingTransport::default());
        let report = router(transport.clone())
            .notify_contacts(&notification(Severity::Medium))
            .await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.channel == Channel::Whatsapp));
        assert!(calls.iter().all(|c| c.text == "Title\nBody"));
        assert_eq!(report.delivered(), 3);
    }

    #[tokio::test]
    async fn test_high_adds_sms_for_sms_contacts() {
        let transport = Arc::new(RecordingTransport::default());
        router(transport.clone())
            .notify_contacts(&notification(Severity::High))
            .await;

        let calls = transport.calls();
        let whatsapp = calls.iter().filter(|c| c.channel == Channel::Whatsapp).count();
        let sms: Vec<_> = calls
            .iter()
            .filter(|c| c.channel == Channel::Sms)
            .map(|c| c.phone.as_str())
            .collect();
        assert_eq!(whatsapp, 3);
        // Maria (caregiver) only has WhatsApp
        assert_eq!(sms, vec!["(86) 98888-7777", "(86) 97777-6666"]);
        assert!(calls.iter().all(|c| c.text.starts_with(URGENT_PREFIX)));
    }

    #[tokio::test]
    async fn test_never_uses_unsupported_channel() {
        let transport = Arc::new(RecordingTransport::default());
        let directory = ContactDirectory::new(vec![Contact::new(
            "Sms Only",
            "555",
            "Neighbor",
            [Channel::Sms],
        )]);
        let router = NotificationRouter::new(directory, transport.clone());

        router.notify_contacts(&notification(Severity::Medium)).await;
        assert!(transport.calls().is_empty());

        router.notify_contacts(&notification(Severity::High)).await;
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].channel, Channel::Sms);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_fan_out() {
        let transport = Arc::new(RecordingTransport::failing_for("(86) 98888-7777"));
        let report = router(transport.clone())
            .notify_contacts(&notification(Severity::High))
            .await;

        // Every eligible send is still attempted
        assert_eq!(transport.calls().len(), 5);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.delivered(), 3);
        assert!(report
            .attempts
            .iter()
            .filter(|a| a.outcome.is_err())
            .all(|a| a.contact == "Francisco Silva"));
    }

    #[test]
    fn test_router_directory_accessors() {
        let transport = Arc::new(RecordingTransport::default());
        let router = router(transport);
        assert_eq!(router.monitored_contact().unwrap().relationship, "Avô");
        assert_eq!(router.caregiver_contact().unwrap().relationship, "Cuidadora");
    }
}
