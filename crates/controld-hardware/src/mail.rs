//! Outbound mail notification.
//!
//! Settings are staged in a pending [`MailSettings`] and take effect only
//! when [`MailClient::apply_settings`] commits them. Each field is an
//! explicit `Option` (or list), so "was this set?" is answered by the type
//! rather than by a separate presence mask.
//!
//! The SMTP wire protocol lives behind [`MailTransport`]. The bundled
//! [`LogTransport`] only logs the rendered message.

use crate::control::Control;
use crate::error::{HardwareError, Result};
use chrono::Local;
use controld_core::ControlId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// `Date:` header layout, RFC 5322 style.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Mail settings; every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// SMTP server URL, e.g. `smtp://smtp.example.com:587`.
    pub server: Option<String>,

    /// Login name, also used as the sender address.
    pub username: Option<String>,

    /// Login password; never reported back to callers.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Subject line.
    pub subject: Option<String>,

    /// `To` recipients.
    pub to: Vec<String>,

    /// `Cc` recipients.
    pub cc: Vec<String>,
}

impl MailSettings {
    /// Check if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay every field that is set in `other` onto `self`.
    ///
    /// Recipient lists are replaced as a whole when `other` carries any.
    pub fn merge(&mut self, other: MailSettings) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.username.is_some() {
            self.username = other.username;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.subject.is_some() {
            self.subject = other.subject;
        }
        if !other.to.is_empty() {
            self.to = other.to;
        }
        if !other.cc.is_empty() {
            self.cc = other.cc;
        }
    }
}

/// A rendered message, one header per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub date: String,
    pub to: String,
    pub cc: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Render a message from committed settings.
    pub fn render(settings: &MailSettings, body: &str) -> Self {
        Self {
            date: format!("Date: {}\r\n", Local::now().format(DATE_FORMAT)),
            to: address_header("To:", &settings.to),
            cc: address_header("Cc:", &settings.cc),
            subject: format!("Subject: {}\r\n", settings.subject.as_deref().unwrap_or("")),
            body: format!("{body}\r\n"),
        }
    }

    /// Full payload in transmission order.
    pub fn payload(&self) -> String {
        [&self.date, &self.to, &self.cc, &self.subject, &self.body]
            .into_iter()
            .map(String::as_str)
            .collect()
    }
}

fn address_header(name: &str, addresses: &[String]) -> String {
    let mut header = String::from(name);
    for address in addresses {
        header.push_str(" <");
        header.push_str(address);
        header.push('>');
    }
    header.push_str(" \r\n");
    header
}

/// Delivery backend for rendered messages.
pub trait MailTransport: Send + std::fmt::Debug {
    /// Deliver one message using the committed settings.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::DeliveryFailed`] if the message could not be
    /// handed off.
    fn deliver(&mut self, settings: &MailSettings, message: &MailMessage) -> Result<()>;
}

/// Transport that logs the message instead of sending it.
#[derive(Debug, Default)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn deliver(&mut self, settings: &MailSettings, message: &MailMessage) -> Result<()> {
        info!(
            server = settings.server.as_deref().unwrap_or(""),
            recipients = settings.to.len() + settings.cc.len(),
            bytes = message.payload().len(),
            "mail delivered"
        );
        Ok(())
    }
}

/// Mail client control object.
#[derive(Debug)]
pub struct MailClient {
    id: ControlId,
    active: MailSettings,
    pending: MailSettings,
    transport: Box<dyn MailTransport>,
    sent: u64,
}

impl MailClient {
    /// Create a client with `initial` settings already committed.
    pub fn new(initial: MailSettings, transport: Box<dyn MailTransport>) -> Self {
        Self {
            id: ControlId::new(0),
            active: initial,
            pending: MailSettings::default(),
            transport,
            sent: 0,
        }
    }

    pub fn set_server(&mut self, server: impl Into<String>) {
        self.pending.server = Some(server.into());
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.pending.username = Some(username.into());
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.pending.password = Some(password.into());
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.pending.subject = Some(subject.into());
    }

    /// Stage `To` recipients.
    ///
    /// Either every address is staged or none is.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::OutOfRange`] if any address is empty.
    pub fn add_to<I>(&mut self, recipients: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let recipients = validated(recipients)?;
        self.pending.to.extend(recipients);
        Ok(())
    }

    /// Stage `Cc` recipients, all or nothing like [`MailClient::add_to`].
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::OutOfRange`] if any address is empty.
    pub fn add_cc<I>(&mut self, recipients: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let recipients = validated(recipients)?;
        self.pending.cc.extend(recipients);
        Ok(())
    }

    /// Commit every staged setting and clear the staging area.
    pub fn apply_settings(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        debug!(empty = pending.is_empty(), "applying mail settings");
        self.active.merge(pending);
    }

    /// Render and deliver a message with the committed settings.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::ConfigurationError`] if no server or no
    /// recipient is configured, or the transport's error.
    pub fn send(&mut self, body: &str) -> Result<()> {
        if self.active.server.is_none() {
            return Err(HardwareError::configuration("no mail server configured"));
        }
        if self.active.to.is_empty() && self.active.cc.is_empty() {
            return Err(HardwareError::configuration("no mail recipients configured"));
        }
        let message = MailMessage::render(&self.active, body);
        self.transport.deliver(&self.active, &message)?;
        self.sent += 1;
        Ok(())
    }

    /// Committed settings.
    pub fn settings(&self) -> &MailSettings {
        &self.active
    }

    /// Staged, not yet applied settings.
    pub fn pending(&self) -> &MailSettings {
        &self.pending
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Control for MailClient {
    const KIND: &'static str = "mail";

    fn id(&self) -> ControlId {
        self.id
    }
}

fn validated<I>(recipients: I) -> Result<Vec<String>>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    recipients
        .into_iter()
        .map(|recipient| {
            let recipient = recipient.into();
            if recipient.trim().is_empty() {
                return Err(HardwareError::out_of_range("empty recipient"));
            }
            Ok(recipient)
        })
        .collect()
}
