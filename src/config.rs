//! Key/value configuration read from `.properties` files.
//!
//! Supported syntax:
//! - Lines end at `\n`, `\r\n` or a lone `\r`.
//! - Blank lines and lines starting with `#` or `!` are ignored.
//! - Keys are separated from values by `=`, `:` or whitespace.
//! - A line ending in an odd number of backslashes continues on the next line,
//!   with the next line's leading whitespace dropped.
//! - Escapes `\t`, `\n`, `\r`, `\f` and `\uXXXX` are decoded; any other escaped
//!   character stands for itself, which is how `\=`, `\:`, `\ ` and `\\` work.
//! - A key that appears twice keeps its last value.

use std::collections::hash_map::{self, HashMap};
use std::fs;
use std::mem;
use std::path::Path;

use crate::error::{ConfigError, Result};

/// An immutable set of string properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
   entries: HashMap<String, String>,
}

impl Properties {
   /// Parses properties from text.
   pub fn parse(source: &str) -> Result<Self> {
      let mut entries = HashMap::new();
      let mut lines = PhysicalLines(source).enumerate();

      while let Some((index, raw)) = lines.next() {
         let line = raw.trim_start_matches(is_blank);
         if line.is_empty() || line.starts_with(['#', '!']) {
            continue;
         }

         let number = index + 1;
         let mut logical = line.to_owned();
         while continues(&logical) {
            logical.pop();
            match lines.next() {
               Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
               None => break,
            }
         }

         let (key, value) = split_entry(&logical);
         entries.insert(unescape(key, number)?, unescape(value, number)?);
      }

      Ok(Self { entries })
   }

   /// Reads and parses the file at `path`.
   pub fn load(path: impl AsRef<Path>) -> Result<Self> {
      let path = path.as_ref();
      let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
         path: path.to_path_buf(),
         source,
      })?;
      let properties = Self::parse(&text)?;
      log::debug!(
         "loaded {} properties from {}",
         properties.len(),
         path.display()
      );
      Ok(properties)
   }

   /// Like [`load`](Self::load), but a missing file is `Ok(None)` rather than
   /// an error.
   pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
      match Self::load(path) {
         Ok(properties) => Ok(Some(properties)),
         Err(err) if err.is_not_found() => Ok(None),
         Err(err) => Err(err),
      }
   }

   /// Loads `path`, falling back to an empty set if it is missing or broken.
   ///
   /// A missing file is expected and only logged at debug level; any other
   /// failure is logged as a warning.
   pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
      let path = path.as_ref();
      match Self::load_optional(path) {
         Ok(Some(properties)) => properties,
         Ok(None) => {
            log::debug!("no configuration at {}", path.display());
            Self::default()
         }
         Err(err) => {
            log::warn!("{err}; continuing with empty configuration");
            Self::default()
         }
      }
   }

   /// Returns the value for `key`, if present.
   #[inline]
   pub fn get(&self, key: &str) -> Option<&str> {
      self.entries.get(key).map(String::as_str)
   }

   /// Returns the value for `key`, or `default` if absent.
   #[inline]
   pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
      self.get(key).unwrap_or(default)
   }

   #[inline]
   pub fn contains_key(&self, key: &str) -> bool {
      self.entries.contains_key(key)
   }

   #[inline]
   pub fn len(&self) -> usize {
      self.entries.len()
   }

   #[inline]
   pub fn is_empty(&self) -> bool {
      self.entries.is_empty()
   }

   /// Iterates over all entries in arbitrary order.
   pub fn iter(&self) -> Iter<'_> {
      Iter(self.entries.iter())
   }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
   fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
      Self {
         entries: iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect(),
      }
   }
}

/// Iterator over `(key, value)` pairs of [`Properties`].
pub struct Iter<'a>(hash_map::Iter<'a, String, String>);

impl<'a> Iterator for Iter<'a> {
   type Item = (&'a str, &'a str);

   fn next(&mut self) -> Option<Self::Item> {
      self.0.next().map(|(k, v)| (k.as_str(), v.as_str()))
   }

   fn size_hint(&self) -> (usize, Option<usize>) {
      self.0.size_hint()
   }
}

impl<'a> IntoIterator for &'a Properties {
   type Item = (&'a str, &'a str);
   type IntoIter = Iter<'a>;

   fn into_iter(self) -> Iter<'a> {
      self.iter()
   }
}

/// Splits on `\n`, `\r\n` and lone `\r`, without yielding the terminators.
struct PhysicalLines<'a>(&'a str);

impl<'a> Iterator for PhysicalLines<'a> {
   type Item = &'a str;

   fn next(&mut self) -> Option<&'a str> {
      if self.0.is_empty() {
         return None;
      }
      let bytes = self.0.as_bytes();
      let Some(end) = bytes.iter().position(|&b| b == b'\n' || b == b'\r') else {
         return Some(mem::take(&mut self.0));
      };
      let skip = if bytes[end] == b'\r' && bytes.get(end + 1) == Some(&b'\n') {
         2
      } else {
         1
      };
      let line = &self.0[..end];
      self.0 = &self.0[end + skip..];
      Some(line)
   }
}

fn is_blank(c: char) -> bool {
   matches!(c, ' ' | '\t' | '\x0c')
}

/// An odd run of trailing backslashes escapes the line break.
fn continues(line: &str) -> bool {
   line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Splits a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
   let mut key_end = line.len();
   let mut escaped = false;
   for (i, c) in line.char_indices() {
      if escaped {
         escaped = false;
      } else if c == '\\' {
         escaped = true;
      } else if c == '=' || c == ':' || is_blank(c) {
         key_end = i;
         break;
      }
   }

   let (key, rest) = line.split_at(key_end);
   let rest = rest.trim_start_matches(is_blank);
   let value = match rest.strip_prefix(['=', ':']) {
      Some(stripped) => stripped.trim_start_matches(is_blank),
      None => rest,
   };
   (key, value)
}

fn unescape(raw: &str, line: usize) -> Result<String> {
   let mut out = String::with_capacity(raw.len());
   let mut chars = raw.chars();
   while let Some(c) = chars.next() {
      if c != '\\' {
         out.push(c);
         continue;
      }
      match chars.next() {
         Some('t') => out.push('\t'),
         Some('n') => out.push('\n'),
         Some('r') => out.push('\r'),
         Some('f') => out.push('\x0c'),
         Some('u') => {
            let digits: String = chars.by_ref().take(4).collect();
            let decoded = (digits.len() == 4 && digits.chars().all(|d| d.is_ascii_hexdigit()))
               .then(|| u32::from_str_radix(&digits, 16).ok())
               .flatten()
               .and_then(char::from_u32)
               .ok_or_else(|| ConfigError::InvalidEscape {
                  line,
                  escape: format!("\\u{digits}"),
               })?;
            out.push(decoded);
         }
         Some(other) => out.push(other),
         None => {}
      }
   }
   Ok(out)
}
