//! Side channels a screen reports through: transient notices and navigation.
use tracing::{error, info};

use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Toaster: Send + Sync {
    fn show(&self, toast: Toast);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Writes notices to the log. Used by the CLI front end.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingToaster;

impl Toaster for TracingToaster {
    fn show(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Success => info!(message = %toast.message, "notice"),
            ToastLevel::Error => error!(message = %toast.message, "notice"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: Route) {
        info!(path = %route, "navigate");
    }
}
