//! Errors raised while loading configuration.
//!
//! The singleton cells themselves never fail; a fallible constructor's own
//! error type is passed through [`Lazy::try_instance`](crate::Lazy::try_instance)
//! untouched.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or parse a `.properties` source.
#[derive(Debug, Error)]
pub enum ConfigError {
   /// The source could not be read.
   #[error("failed to read configuration from {}: {source}", .path.display())]
   Io {
      /// The file that was being read.
      path: PathBuf,
      /// The underlying I/O error.
      #[source]
      source: io::Error,
   },

   /// A `\uXXXX` escape was truncated, not hexadecimal, or not a scalar value.
   #[error("line {line}: invalid escape sequence `{escape}`")]
   InvalidEscape {
      /// 1-based line on which the entry starts.
      line: usize,
      /// The offending escape as written.
      escape: String,
   },
}

impl ConfigError {
   /// Whether the error means the source simply does not exist.
   pub fn is_not_found(&self) -> bool {
      matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
   }
}

/// Shorthand `Result` for configuration loading.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
