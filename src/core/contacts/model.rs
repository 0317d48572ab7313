use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// External delivery channel a contact can be reached on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Whatsapp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
    #[serde(rename = "notifyVia", alias = "channels")]
    pub channels: BTreeSet<Channel>,
}

impl Contact {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        relationship: impl Into<String>,
        channels: impl IntoIterator<Item = Channel>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            relationship: relationship.into(),
            channels: channels.into_iter().collect(),
        }
    }

    pub fn supports(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }
}

/// People to notify, plus which of them is the monitored person and which
/// is the primary caregiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDirectory {
    contacts: Vec<Contact>,
    #[serde(default = "default_monitored_index")]
    monitored_index: usize,
    #[serde(default = "default_caregiver_index")]
    caregiver_index: usize,
}

fn default_monitored_index() -> usize {
    0
}

fn default_caregiver_index() -> usize {
    1
}

impl ContactDirectory {
    /// Monitored person first, caregiver second.
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            monitored_index: default_monitored_index(),
            caregiver_index: default_caregiver_index(),
        }
    }

    pub fn with_roles(mut self, monitored_index: usize, caregiver_index: usize) -> Self {
        self.monitored_index = monitored_index;
        self.caregiver_index = caregiver_index;
        self
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn monitored_contact(&self) -> Option<&Contact> {
        self.contacts.get(self.monitored_index)
    }

    pub fn caregiver_contact(&self) -> Option<&Contact> {
        self.contacts.get(self.caregiver_index)
    }
}

impl Default for ContactDirectory {
    fn default() -> Self {
        Self::new(vec![
            Contact::new(
                "Francisco Silva",
                "(86) 98888-7777",
                "Avô",
                [Channel::Whatsapp, Channel::Sms],
            ),
            Contact::new(
                "Maria Silva",
                "(86) 99999-9999",
                "Cuidadora",
                [Channel::Whatsapp],
            ),
            Contact::new(
                "João Silva",
                "(86) 97777-6666",
                "Filho",
                [Channel::Whatsapp, Channel::Sms],
            ),
        ])
    }
}
