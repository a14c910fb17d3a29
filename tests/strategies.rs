//! Stress tests comparing construction strategies under concurrent first access.
//!
//! The unguarded and fully locked cells below are fixtures for comparison
//! only; the crate does not ship either.

use std::collections::HashSet;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Barrier, Mutex, PoisonError};
use std::thread;

use poly_singleton::{Eager, Lazy, Singleton};

const THREADS: usize = 100;
const ROUNDS: usize = 50;

/// Payload large enough that distinct instances have distinct addresses.
#[derive(Debug)]
struct Instance {
   serial: usize,
}

/// Check-then-store with no guard: two callers can both see an empty slot.
struct Unguarded<T> {
   slot: AtomicPtr<T>,
   init: fn() -> T,
}

impl<T> Unguarded<T> {
   const fn new(init: fn() -> T) -> Self {
      Self {
         slot: AtomicPtr::new(ptr::null_mut()),
         init,
      }
   }

   fn instance(&self) -> &T {
      let current = self.slot.load(Ordering::Acquire);
      if !current.is_null() {
         // SAFETY: published pointers come from leaked boxes.
         return unsafe { &*current };
      }
      let fresh = Box::into_raw(Box::new((self.init)()));
      thread::yield_now();
      self.slot.store(fresh, Ordering::Release);
      // SAFETY: leaked, never freed.
      unsafe { &*fresh }
   }
}

/// Takes a mutex on every call, forever.
struct FullyLocked<T: 'static> {
   slot: Mutex<Option<&'static T>>,
   init: fn() -> T,
}

impl<T: 'static> FullyLocked<T> {
   const fn new(init: fn() -> T) -> Self {
      Self {
         slot: Mutex::new(None),
         init,
      }
   }

   fn instance(&self) -> &'static T {
      let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
      *slot.get_or_insert_with(|| &*Box::leak(Box::new((self.init)())))
   }
}

/// Releases `THREADS` callers at once and collects the addresses they observe.
fn race<T, G>(get: G) -> HashSet<usize>
where
   G: Fn() -> *const T + Sync,
{
   let barrier = Barrier::new(THREADS);
   thread::scope(|s| {
      let handles: Vec<_> = (0..THREADS)
         .map(|i| {
            let barrier = &barrier;
            let get = &get;
            s.spawn(move || {
               barrier.wait();
               if i % 2 == 0 {
                  thread::yield_now();
               }
               get() as usize
            })
         })
         .collect();
      handles.into_iter().map(|h| h.join().unwrap()).collect()
   })
}

#[test]
fn test_lazy_single_identity_under_stress() {
   for _ in 0..ROUNDS {
      let builds = AtomicUsize::new(0);
      let lazy = Lazy::new(|| Instance {
         serial: builds.fetch_add(1, Ordering::SeqCst),
      });

      let seen = race(|| lazy.instance() as *const Instance);

      assert_eq!(seen.len(), 1);
      assert_eq!(builds.load(Ordering::SeqCst), 1);
      assert_eq!(lazy.instance().serial, 0);
   }
}

#[test]
fn test_lazy_rearmed_between_rounds() {
   let builds = AtomicUsize::new(0);
   let mut lazy = Lazy::new(|| Instance {
      serial: builds.fetch_add(1, Ordering::SeqCst),
   });

   for round in 0..ROUNDS {
      let seen = race(|| lazy.instance() as *const Instance);
      assert_eq!(seen.len(), 1);
      assert_eq!(lazy.instance().serial, round);
      assert!(lazy.reset().is_some());
   }
   assert_eq!(builds.load(Ordering::SeqCst), ROUNDS);
}

#[test]
fn test_fallible_lazy_single_identity_under_stress() {
   for _ in 0..ROUNDS {
      let attempts = AtomicUsize::new(0);
      let lazy = Lazy::new(|| {
         let attempt = attempts.fetch_add(1, Ordering::SeqCst);
         if attempt < 3 {
            Err(attempt)
         } else {
            Ok(Instance { serial: attempt })
         }
      });

      let seen = race(|| loop {
         if let Ok(instance) = lazy.try_instance() {
            break instance as *const Instance;
         }
      });

      assert_eq!(seen.len(), 1);
      assert_eq!(attempts.load(Ordering::SeqCst), 4);
      assert_eq!(lazy.get().map(|instance| instance.serial), Some(3));
   }
}

#[test]
fn test_eager_single_identity() {
   static EAGER: Eager<Instance> = Eager::new(Instance { serial: 11 });

   let seen = race(|| EAGER.instance() as *const Instance);
   assert_eq!(seen.len(), 1);
   assert_eq!(EAGER.serial, 11);
}

static HOLDER_BUILDS: AtomicUsize = AtomicUsize::new(0);

struct Held {
   serial: usize,
}

impl Held {
   fn build() -> Self {
      Self {
         serial: HOLDER_BUILDS.fetch_add(1, Ordering::SeqCst),
      }
   }
}

poly_singleton::singleton!(lazy Held => Held::build);

#[test]
fn test_holder_single_identity() {
   let seen = race(|| Held::instance() as *const Held);
   assert_eq!(seen.len(), 1);
   assert_eq!(HOLDER_BUILDS.load(Ordering::SeqCst), 1);
   assert_eq!(Held::instance().serial, 0);
}

#[test]
fn test_fully_locked_constructs_once() {
   static BUILDS: AtomicUsize = AtomicUsize::new(0);
   fn build() -> Instance {
      Instance {
         serial: BUILDS.fetch_add(1, Ordering::SeqCst),
      }
   }

   for round in 0..ROUNDS {
      let locked = FullyLocked::new(build);
      let seen = race(|| locked.instance() as *const Instance);
      assert_eq!(seen.len(), 1);
      assert_eq!(locked.instance().serial, round);
   }
   assert_eq!(BUILDS.load(Ordering::SeqCst), ROUNDS);
}

/// The unguarded cell is a known construction race. Nothing is asserted
/// beyond "at least one instance"; the test records how often the race shows.
#[test]
fn test_unguarded_can_construct_more_than_once() {
   static BUILDS: AtomicUsize = AtomicUsize::new(0);
   fn build() -> Instance {
      Instance {
         serial: BUILDS.fetch_add(1, Ordering::SeqCst),
      }
   }

   let mut racy_rounds = 0;
   for _ in 0..ROUNDS {
      let unguarded = Unguarded::new(build);
      let seen = race(|| unguarded.instance() as *const Instance);
      assert!(!seen.is_empty());
      if seen.len() > 1 {
         racy_rounds += 1;
      }
   }
   eprintln!(
      "unguarded cell: {racy_rounds}/{ROUNDS} rounds produced more than one instance \
       ({} constructions)",
      BUILDS.load(Ordering::SeqCst)
   );
   assert!(BUILDS.load(Ordering::SeqCst) >= ROUNDS);
}
