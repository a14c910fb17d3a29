//! Message sinks used by the application singleton.

use core::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};

/// Accepts human-readable messages.
pub trait MessageSink: Send + Sync {
   fn emit(&self, message: &str);
}

impl<S: MessageSink + ?Sized> MessageSink for Arc<S> {
   fn emit(&self, message: &str) {
      (**self).emit(message);
   }
}

impl<S: MessageSink + ?Sized> MessageSink for Box<S> {
   fn emit(&self, message: &str) {
      (**self).emit(message);
   }
}

/// Prints `[timestamp] message` lines to standard output using local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampedStdout;

impl MessageSink for TimestampedStdout {
   fn emit(&self, message: &str) {
      println!("{}", stamp(&Local::now(), message));
   }
}

/// Forwards messages to the `log` facade at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
   fn emit(&self, message: &str) {
      log::info!(target: "poly_singleton::app", "{message}");
   }
}

/// Formats a message with a millisecond-precision ISO-8601 timestamp prefix.
pub fn stamp<Tz>(at: &DateTime<Tz>, message: &str) -> String
where
   Tz: TimeZone,
   Tz::Offset: fmt::Display,
{
   format!("[{}] {message}", at.format("%Y-%m-%dT%H:%M:%S%.3f"))
}

#[cfg(test)]
mod tests {
   use std::sync::Mutex;

   use chrono::Utc;
   use log::{Level, LevelFilter, Log, Metadata, Record};

   use super::*;

   /// Keeps every record aimed at the application target.
   struct Capture(Mutex<Vec<(Level, String)>>);

   impl Log for Capture {
      fn enabled(&self, metadata: &Metadata<'_>) -> bool {
         metadata.target() == "poly_singleton::app"
      }

      fn log(&self, record: &Record<'_>) {
         if self.enabled(record.metadata()) {
            let mut records = self.0.lock().unwrap();
            records.push((record.level(), record.args().to_string()));
         }
      }

      fn flush(&self) {}
   }

   static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

   #[test]
   fn test_stamp_format() {
      let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
      assert_eq!(
         stamp(&at, "Application started."),
         "[2026-01-02T03:04:05.000] Application started."
      );
   }

   #[test]
   fn test_stamp_keeps_message_verbatim() {
      let at = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
      assert_eq!(stamp(&at, "[x] {y}"), "[2026-12-31T23:59:59.000] [x] {y}");
   }

   #[test]
   fn test_log_sink_forwards_at_info() {
      log::set_logger(&CAPTURE).unwrap();
      log::set_max_level(LevelFilter::Trace);

      LogSink.emit("Configuration loaded successfully");
      let boxed: Box<dyn MessageSink> = Box::new(Arc::new(LogSink));
      boxed.emit("Database URL: postgres://db/app");

      let records = CAPTURE.0.lock().unwrap().clone();
      assert_eq!(
         records,
         vec![
            (Level::Info, "Configuration loaded successfully".to_string()),
            (Level::Info, "Database URL: postgres://db/app".to_string()),
         ]
      );
   }

   #[test]
   fn test_timestamped_stdout_emits() {
      let sink: Arc<dyn MessageSink> = Arc::new(TimestampedStdout);
      sink.emit("timestamped line");
      TimestampedStdout.emit("");
   }
}
