//! Eagerly constructed singleton.

use core::fmt;
use core::ops::Deref;

/// An instance built in its `static` initializer, before anyone asks for it.
///
/// There is no race to guard against: the value exists for the whole life of
/// the program and access is a plain reference. The trade-off is that the
/// value must be `const`-constructible and is paid for even if never used.
///
/// ```rust
/// use poly_singleton::Eager;
///
/// struct Limits {
///    max_connections: u32,
/// }
///
/// static LIMITS: Eager<Limits> = Eager::new(Limits { max_connections: 64 });
///
/// assert_eq!(LIMITS.instance().max_connections, 64);
/// ```
pub struct Eager<T> {
   value: T,
}

impl<T> Eager<T> {
   /// Wraps an already constructed instance.
   #[inline]
   #[must_use]
   pub const fn new(value: T) -> Self {
      Self { value }
   }

   /// Returns the instance. Never blocks.
   #[inline]
   pub const fn instance(&self) -> &T {
      &self.value
   }
}

impl<T> Deref for Eager<T> {
   type Target = T;

   #[inline]
   fn deref(&self) -> &T {
      &self.value
   }
}

impl<T: fmt::Debug> fmt::Debug for Eager<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("Eager").field(&self.value).finish()
   }
}
