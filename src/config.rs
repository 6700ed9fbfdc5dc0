//! Process-wide configuration
//!
//! Holds the global custom error map and the locale error map. Readers clone
//! the current `Arc` under a briefly held read lock; writers are serialised
//! and swap in a modified copy, so a reader never observes a half-written
//! configuration.

use crate::issues::ErrorMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

/// Global configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Custom error map, consulted before the locale map
    pub custom_error: Option<ErrorMap>,
    /// Locale error map; built-in English is used when unset
    pub locale_error: Option<ErrorMap>,
}

impl Config {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the custom error map
    pub fn with_custom_error(mut self, map: ErrorMap) -> Self {
        self.custom_error = Some(map);
        self
    }

    /// Set the locale error map
    pub fn with_locale_error(mut self, map: ErrorMap) -> Self {
        self.locale_error = Some(map);
        self
    }
}

lazy_static::lazy_static! {
    static ref CURRENT: RwLock<Arc<Config>> = RwLock::new(Arc::new(Config::default()));
    static ref WRITER: Mutex<()> = Mutex::new(());
}

/// Read-only snapshot of the current configuration
///
/// Later updates do not affect a snapshot already taken.
pub fn config() -> Arc<Config> {
    CURRENT.read().clone()
}

/// Replace or reset the global configuration
///
/// `None` resets to an empty configuration. `Some` overwrites only the maps
/// that are set, leaving the others as they were.
pub fn set_config(update: Option<Config>) {
    let _writer = WRITER.lock();

    let next = match update {
        None => {
            debug!("resetting global configuration");
            Config::default()
        }
        Some(update) => {
            let mut next = (*config()).clone();
            if let Some(map) = update.custom_error {
                next.custom_error = Some(map);
            }
            if let Some(map) = update.locale_error {
                next.locale_error = Some(map);
            }
            debug!(
                custom_error = next.custom_error.is_some(),
                locale_error = next.locale_error.is_some(),
                "updated global configuration"
            );
            next
        }
    };

    *CURRENT.write() = Arc::new(next);
}

#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = parking_lot::const_mutex(());
