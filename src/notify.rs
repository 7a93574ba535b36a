//! Notification surface.
//!
//! Every attempt that passes validation fires `loading` first and then exactly
//! one of `success` or `error`. A rejected attempt fires a single `warning` or
//! `error` with no `loading` before it.

use crate::error::Severity;

pub trait Notifier {
    fn loading(&self, message: &str);
    fn success(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);

    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => self.warning(message),
            Severity::Error => self.error(message),
        }
    }
}

/// Routes notifications to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn loading(&self, message: &str) {
        log::debug!("{}", message);
    }

    fn success(&self, message: &str) {
        log::info!("{}", message);
    }

    fn warning(&self, message: &str) {
        log::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }
}
