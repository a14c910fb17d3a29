//! Double-checked lazy singleton.
//!
//! [`Lazy<T, F>`] stores its constructor next to an uninitialized slot for
//! the instance. The first call to [`Lazy::instance`] runs the constructor
//! under the cell's lock and publishes the result; every later call is a
//! single `Acquire` load followed by a plain reference.
//!
//! Construction that fails (by returning `Err`, panicking, or by its future
//! being dropped) is never remembered: the cell goes back to pending and the
//! next caller tries again.

use core::cell::UnsafeCell;
use core::future::Future;
use core::ops::Deref;
use core::{fmt, mem};

use crate::state::{InitGuard, InitState};

/// A process-wide instance constructed at most once, on first access.
///
/// Usually declared as a `static` so the constructor can be any `fn() -> T`:
///
/// ```rust
/// use poly_singleton::Lazy;
///
/// struct Registry {
///    names: Vec<&'static str>,
/// }
///
/// static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry {
///    names: vec!["alpha", "beta"],
/// });
///
/// assert_eq!(REGISTRY.instance().names.len(), 2);
/// assert!(std::ptr::eq(REGISTRY.instance(), REGISTRY.instance()));
/// ```
///
/// Calling `instance()` on the same cell from inside its own constructor
/// deadlocks.
pub struct Lazy<T, F = fn() -> T> {
   value: UnsafeCell<mem::MaybeUninit<T>>,
   state: InitState,
   init: F,
}

impl<T, F> Lazy<T, F> {
   /// Creates a pending cell that will build its instance with `init`.
   #[inline]
   #[must_use]
   pub const fn new(init: F) -> Self {
      Self {
         value: UnsafeCell::new(mem::MaybeUninit::uninit()),
         state: InitState::pending(),
         init,
      }
   }

   /// Whether the instance has been constructed and published.
   ///
   /// Never blocks and never runs the constructor.
   #[inline]
   pub fn is_constructed(&self) -> bool {
      self.state.is_ready()
   }

   /// Returns the instance if it has already been constructed.
   ///
   /// Never blocks and never runs the constructor; returns `None` while
   /// another caller is still constructing.
   #[inline]
   pub fn get(&self) -> Option<&T> {
      if self.state.is_ready() {
         // SAFETY: READY was observed with Acquire, so the value is written
         // and visible.
         Some(unsafe { self.get_unchecked() })
      } else {
         None
      }
   }

   /// Returns a mutable reference to the instance if it has been constructed.
   #[inline]
   pub fn get_mut(&mut self) -> Option<&mut T> {
      if self.state.is_ready() {
         // SAFETY: initialized, and `&mut self` rules out other readers.
         Some(unsafe { self.value.get_mut().assume_init_mut() })
      } else {
         None
      }
   }

   /// Drops back to the pending state, handing out the old instance.
   ///
   /// The next `instance()` call constructs a fresh one. Exclusive access is
   /// required, so a `static` can never be reset and no reader can hold a
   /// reference across the reset.
   pub fn reset(&mut self) -> Option<T> {
      if self.state.rearm() {
         // SAFETY: the value was initialized and the state no longer says so,
         // so it is read out exactly once.
         Some(unsafe { self.value.get_mut().assume_init_read() })
      } else {
         None
      }
   }

   /// # Safety
   ///
   /// The instance must be published.
   #[inline]
   unsafe fn get_unchecked(&self) -> &T {
      debug_assert!(self.state.is_ready(), "get_unchecked on a pending Lazy");
      unsafe { (*self.value.get()).assume_init_ref() }
   }

   /// Writes `value` and publishes it through `guard`.
   #[inline]
   fn publish(&self, guard: InitGuard<'_>, value: T) -> &T {
      // SAFETY: owning the guard means nobody else writes or reads the slot
      // until READY is set.
      let instance = unsafe { (*self.value.get()).write(value) };
      guard.publish();
      instance
   }

   /// Returns the instance, constructing it with `init` on first access.
   ///
   /// Concurrent first-time callers park until the winner has published the
   /// instance; all of them receive the same reference. If the constructor
   /// panics the panic reaches the caller that ran it and the cell stays
   /// pending.
   #[inline]
   pub fn instance(&self) -> &T
   where
      F: Fn() -> T,
   {
      if let Some(instance) = self.get() {
         return instance;
      }
      self.construct()
   }

   /// Returns the instance, constructing it with a fallible `init`.
   ///
   /// - On success the instance is published and returned, now and forever.
   /// - On `Err(e)` the error is returned to this caller only and the cell
   ///   stays pending; the next call runs the constructor again.
   pub fn try_instance<E>(&self) -> Result<&T, E>
   where
      F: Fn() -> Result<T, E>,
   {
      if let Some(instance) = self.get() {
         return Ok(instance);
      }
      self.try_construct()
   }

   /// Async counterpart of [`instance`](Self::instance) for constructors
   /// returning a future.
   ///
   /// Dropping the returned future while it holds the construction slot
   /// re-arms the cell.
   pub async fn instance_async<Fut>(&self) -> &T
   where
      F: Fn() -> Fut,
      Fut: Future<Output = T>,
   {
      if let Some(instance) = self.get() {
         return instance;
      }
      match self.state.claim_async().await {
         // SAFETY: claim returns None only once READY is observed.
         None => unsafe { self.get_unchecked() },
         Some(guard) => {
            let value = (self.init)().await;
            self.publish(guard, value)
         }
      }
   }

   /// Async counterpart of [`try_instance`](Self::try_instance).
   pub async fn try_instance_async<Fut, E>(&self) -> Result<&T, E>
   where
      F: Fn() -> Fut,
      Fut: Future<Output = Result<T, E>>,
   {
      if let Some(instance) = self.get() {
         return Ok(instance);
      }
      match self.state.claim_async().await {
         // SAFETY: claim returns None only once READY is observed.
         None => Ok(unsafe { self.get_unchecked() }),
         Some(guard) => {
            let value = (self.init)().await?;
            Ok(self.publish(guard, value))
         }
      }
   }

   #[cold]
   fn construct(&self) -> &T
   where
      F: Fn() -> T,
   {
      match self.state.claim() {
         // SAFETY: someone else published while we were parked.
         None => unsafe { self.get_unchecked() },
         Some(guard) => {
            log::debug!(
               "constructing singleton instance of `{}`",
               core::any::type_name::<T>()
            );
            self.publish(guard, (self.init)())
         }
      }
   }

   #[cold]
   fn try_construct<E>(&self) -> Result<&T, E>
   where
      F: Fn() -> Result<T, E>,
   {
      match self.state.claim() {
         // SAFETY: someone else published while we were parked.
         None => Ok(unsafe { self.get_unchecked() }),
         Some(guard) => {
            // An error drops the guard, which re-arms the cell.
            let value = (self.init)()?;
            Ok(self.publish(guard, value))
         }
      }
   }
}

// SAFETY: the instance is shared as `&T` across threads (`T: Sync`) and may be
// constructed on one thread and dropped on another (`T: Send`). The
// constructor only runs while holding the construction slot, so it is never
// called concurrently and only needs to be `Send`.
unsafe impl<T: Send + Sync, F: Send> Sync for Lazy<T, F> {}
// SAFETY: moving the cell moves the instance and the constructor with it.
unsafe impl<T: Send, F: Send> Send for Lazy<T, F> {}

impl<T, F> Deref for Lazy<T, F>
where
   F: Fn() -> T,
{
   type Target = T;

   #[inline]
   fn deref(&self) -> &T {
      self.instance()
   }
}

impl<T: Default> Default for Lazy<T> {
   /// A cell that builds `T::default()` on first access.
   #[inline]
   fn default() -> Self {
      Self::new(T::default)
   }
}

impl<T: fmt::Debug, F> fmt::Debug for Lazy<T, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("Lazy");
      match self.get() {
         Some(instance) => d.field(instance),
         None => d.field(&format_args!("<uninit>")),
      };
      d.finish()
   }
}

impl<T, F> Drop for Lazy<T, F> {
   #[inline]
   fn drop(&mut self) {
      if self.state.is_ready() {
         // SAFETY: initialized, exclusive access, and never read again.
         unsafe { self.value.get_mut().assume_init_drop() };
      }
   }
}
