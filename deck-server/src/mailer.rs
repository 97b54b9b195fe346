/// Outbound e-mail
use tracing::info;

use crate::error::Result;

/// Delivers account e-mails.
pub trait Mailer: Send + Sync {
    fn send_verification(&self, to: &str, username: &str, link: &str) -> Result<()>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_verification(&self, to: &str, username: &str, link: &str) -> Result<()> {
        info!(%to, %username, %link, "verification e-mail");
        Ok(())
    }
}
