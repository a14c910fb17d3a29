//! Holder-style singletons: one instance per type, reached through the type.

/// A type with exactly one process-wide instance.
///
/// Implement it with [`singleton!`](crate::singleton). Keeping the type's
/// fields private to its module then leaves `instance()` as the only way for
/// outside code to obtain a value.
pub trait Singleton: Sized + Send + Sync + 'static {
   /// Returns the process-wide instance, constructing it if needed.
   fn instance() -> &'static Self;
}

/// Implements [`Singleton`] by hiding the instance in a function-local
/// `static`.
///
/// The holder `static` is only reachable from inside `instance()`, so nothing
/// else in the program can read, replace or construct it.
///
/// - `singleton!(lazy Type => constructor)` builds the instance on the first
///   call, backed by [`Lazy`](crate::Lazy). `constructor` is any
///   `fn() -> Type`, including a non-capturing closure.
/// - `singleton!(eager Type = const_expr)` builds it up front, backed by
///   [`Eager`](crate::Eager).
///
/// ```rust
/// mod service {
///    pub struct Service {
///       started: std::time::Instant,
///    }
///
///    impl Service {
///       fn start() -> Self {
///          Self {
///             started: std::time::Instant::now(),
///          }
///       }
///
///       pub fn started(&self) -> std::time::Instant {
///          self.started
///       }
///    }
///
///    poly_singleton::singleton!(lazy Service => Service::start);
/// }
///
/// use poly_singleton::Singleton;
///
/// let first = service::Service::instance();
/// let second = service::Service::instance();
/// assert!(std::ptr::eq(first, second));
/// assert_eq!(first.started(), second.started());
/// ```
#[macro_export]
macro_rules! singleton {
   (lazy $ty:ty => $init:expr $(,)?) => {
      impl $crate::Singleton for $ty {
         fn instance() -> &'static Self {
            static HOLDER: $crate::Lazy<$ty> = $crate::Lazy::new($init);
            HOLDER.instance()
         }
      }
   };
   (eager $ty:ty = $value:expr $(,)?) => {
      impl $crate::Singleton for $ty {
         fn instance() -> &'static Self {
            static HOLDER: $crate::Eager<$ty> = $crate::Eager::new($value);
            HOLDER.instance()
         }
      }
   };
}
