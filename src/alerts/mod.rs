//! Process-wide alerting.
//!
//! At most one [`Alerter`] is installed per process. [`notify`] is safe to
//! call from anywhere: it is a no-op without an installed alerter and it
//! swallows delivery failures after logging them.

mod telegram;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use log::warn;

use crate::error_handling::AlertError;

pub use telegram::{chunk_text, TelegramAlerter};

/// Delivers alert text somewhere a human will see it.
#[async_trait]
pub trait Alerter: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), AlertError>;
}

static INSTALLED: OnceLock<Arc<dyn Alerter>> = OnceLock::new();

/// Installs `alerter` for the process.
///
/// Returns `false` and keeps the existing one if an alerter is already installed.
pub fn install(alerter: Arc<dyn Alerter>) -> bool {
    INSTALLED.set(alerter).is_ok()
}

pub fn is_installed() -> bool {
    INSTALLED.get().is_some()
}

/// Sends `text` through the installed alerter, if any.
pub async fn notify(text: &str) {
    let Some(alerter) = INSTALLED.get() else {
        return;
    };
    if let Err(e) = alerter.send_text(text).await {
        warn!("Failed to deliver alert: {e}");
    }
}
