use anyhow::Result;
use interfaces::defs::{DigestDocument, DigestSink};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

pub const SUBJECT: &str = "Daily News";
pub const TEXT_BODY: &str = "This is your daily news.\n\n--\n\n";

/// Port on which the server expects TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("missing or invalid setting {0}")]
    Config(String),
}

/// SMTP account and recipient. Every key is required.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self, DeliveryError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeliveryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DeliveryError::Config(key.to_string()))
        };

        let port = required("EMAIL_SMTP_PORT")?;
        Ok(Self {
            host: required("EMAIL_SMTP")?,
            port: port
                .parse()
                .map_err(|_| DeliveryError::Config(format!("EMAIL_SMTP_PORT={:?}", port)))?,
            user: required("EMAIL_USER")?,
            password: required("EMAIL_PASSWORD")?,
            from: required("EMAIL_FROM")?,
            to: required("KINDLE_EMAIL")?,
        })
    }

    pub fn implicit_tls(&self) -> bool {
        self.port == IMPLICIT_TLS_PORT
    }
}

/// The digest mail: a short plain-text note with the document attached.
pub fn build_message(config: &SmtpConfig, document: &DigestDocument) -> Result<Message, DeliveryError> {
    let from: Mailbox = config.from.parse()?;
    let to: Mailbox = config.to.parse()?;
    let attachment = Attachment::new(document.file_name.clone())
        .body(document.bytes.clone(), ContentType::parse(&document.content_type)?);

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(SUBJECT)
        .date_now()
        .multipart(
            MultiPart::mixed()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(TEXT_BODY.to_string()),
                )
                .singlepart(attachment),
        )?;
    Ok(message)
}

/// Sends digests to the configured recipient over SMTP.
pub struct EmailDelivery {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailDelivery {
    /// Port 465 connects with TLS right away; any other port upgrades with
    /// STARTTLS. No connection is opened until the first delivery.
    pub fn new(config: SmtpConfig) -> Result<Self, DeliveryError> {
        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .build();

        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }
}

impl DigestSink for EmailDelivery {
    async fn deliver(&self, document: &DigestDocument) -> Result<()> {
        let message = build_message(&self.config, document)?;
        debug!("Connecting to {}:{}", self.config.host, self.config.port);
        self.transport.send(message).await.map_err(DeliveryError::from)?;
        info!("Sent {} to {}", document.file_name, self.config.to);
        Ok(())
    }
}
