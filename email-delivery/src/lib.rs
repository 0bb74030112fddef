pub mod smtp;

pub use smtp::{build_message, DeliveryError, EmailDelivery, SmtpConfig};
