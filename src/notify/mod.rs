//! Notification pipeline — body composition and mail dispatch.

pub mod composer;
pub mod mailer;
pub mod template;

pub use composer::{Composer, EmailBody};
pub use mailer::{MailTransport, SmtpConfig, SmtpMailer};
