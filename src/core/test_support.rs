// Test doubles shared by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::alerts::push::PushSurface;
use super::contacts::model::Channel;
use super::contacts::router::ChannelTransport;
use super::error::{PushError, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: Channel,
    pub phone: String,
    pub text: String,
}

/// Records every send; optionally fails all sends to one phone number.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<SentMessage>>,
    failing_phone: Option<String>,
}

impl RecordingTransport {
    pub fn failing_for(phone: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_phone: Some(phone.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<SentMessage> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, channel: Channel, phone: &str, text: &str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(SentMessage {
            channel,
            phone: phone.to_string(),
            text: text.to_string(),
        });
        if self.failing_phone.as_deref() == Some(phone) {
            return Err(TransportError::Rejected {
                channel,
                phone: phone.to_string(),
                reason: "number unreachable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelTransport for RecordingTransport {
    async fn send_whatsapp(&self, phone: &str, text: &str) -> Result<(), TransportError> {
        self.record(Channel::Whatsapp, phone, text)
    }

    async fn send_sms(&self, phone: &str, text: &str) -> Result<(), TransportError> {
        self.record(Channel::Sms, phone, text)
    }
}

#[derive(Debug, Default)]
pub struct RecordingPush {
    shown: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingPush {
    pub fn failing() -> Self {
        Self {
            shown: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().unwrap().clone()
    }
}

impl PushSurface for RecordingPush {
    fn show(&self, title: &str, body: &str) -> Result<(), PushError> {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        if self.fail {
            return Err(PushError::Rejected("surface closed".to_string()));
        }
        Ok(())
    }
}
