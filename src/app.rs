//! Application-wide manager combining configuration and a logger.
//!
//! [`AppManager`] is a holder-style singleton: the first call to
//! [`AppManager::instance`](crate::Singleton::instance) reads
//! [`DEFAULT_CONFIG_PATH`] from the working directory and every later call
//! hands back the same manager.
//!
//! ```rust,no_run
//! use poly_singleton::app::AppManager;
//! use poly_singleton::Singleton;
//!
//! let manager = AppManager::instance();
//! manager.log("Application started.");
//! let db_url = manager.config("db.url").unwrap_or("<unset>");
//! manager.log(&format!("Database URL: {db_url}"));
//! ```

use std::path::Path;

use crate::config::Properties;
use crate::sink::{MessageSink, TimestampedStdout};

/// Configuration file read by [`AppManager::instance`](crate::Singleton::instance).
pub const DEFAULT_CONFIG_PATH: &str = "app.properties";

/// Process-wide configuration and logging.
///
/// Cannot be constructed outside this crate; use
/// [`Singleton::instance`](crate::Singleton::instance).
pub struct AppManager {
   config: Properties,
   sink: Box<dyn MessageSink>,
}

crate::singleton!(lazy AppManager => AppManager::load_default);

impl AppManager {
   fn load_default() -> Self {
      Self::load(DEFAULT_CONFIG_PATH, Box::new(TimestampedStdout))
   }

   /// Builds a manager from the file at `path`, reporting the outcome through
   /// `sink`. A missing or unreadable file leaves the configuration empty.
   pub(crate) fn load(path: impl AsRef<Path>, sink: Box<dyn MessageSink>) -> Self {
      let mut manager = Self::from_parts(Properties::default(), sink);
      match Properties::load_optional(path) {
         Ok(Some(config)) => {
            manager.config = config;
            manager.log("Configuration loaded successfully");
         }
         Ok(None) => manager.log("No configuration file found"),
         Err(err) => manager.log(&format!("Error loading configuration: {err}")),
      }
      manager
   }

   pub(crate) fn from_parts(config: Properties, sink: Box<dyn MessageSink>) -> Self {
      Self { config, sink }
   }

   /// Returns the configured value for `key`, if any.
   #[inline]
   pub fn config(&self, key: &str) -> Option<&str> {
      self.config.get(key)
   }

   /// The full configuration.
   #[inline]
   pub fn properties(&self) -> &Properties {
      &self.config
   }

   /// Sends `message` to the manager's sink.
   pub fn log(&self, message: &str) {
      self.sink.emit(message);
   }
}
