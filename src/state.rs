//! Publication state shared by the lazily constructed singletons.
//!
//! Every [`Lazy`](crate::Lazy) owns one `AtomicU8` laid out as:
//! - Bit 0: `READY` - the instance has been written and published
//! - Bit 1: `BUSY` - one caller owns the construction slot
//! - Bit 2: `PARKED` - at least one caller is parked waiting on `BUSY`
//! - Bits 3-7: generation, bumped on every publish or re-arm
//!
//! `READY` is only ever set by a `Release` swap after the value has been
//! written, and every read that leads to dereferencing the value uses
//! `Acquire`. A caller that observes `READY` therefore also observes the fully
//! constructed instance.
//!
//! Blocking is done with `parking_lot_core` keyed on the address of the state
//! word, so an idle cell costs a single byte and no OS handle.

use core::mem;
use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// Atomic construction state of a single lazy singleton.
#[repr(transparent)]
pub(crate) struct InitState(AtomicU8);

impl InitState {
   const READY: u8 = 1;
   const BUSY: u8 = 2;
   const PARKED: u8 = 4;
   const GENERATION_1: u8 = 8;
   const GENERATION_MASK: u8 = !(Self::READY | Self::BUSY | Self::PARKED);

   /// Rounds of `yield_now` an async caller spends before blocking its worker.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   const ASYNC_SPIN_ROUNDS: u32 = 16;
   /// Yields per round; a round ends early once the state word changes.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   const ASYNC_YIELDS: u32 = 32;

   #[inline(always)]
   const fn next_generation(state: u8) -> u8 {
      (state & Self::GENERATION_MASK).wrapping_add(Self::GENERATION_1) & Self::GENERATION_MASK
   }

   /// A state with nothing constructed and nobody constructing.
   #[inline]
   pub(crate) const fn pending() -> Self {
      Self(AtomicU8::new(0))
   }

   /// Whether the instance has been published.
   ///
   /// Uses `Acquire`, so a `true` result makes the constructed value visible
   /// to the caller.
   #[inline]
   pub(crate) fn is_ready(&self) -> bool {
      self.0.load(Ordering::Acquire) & Self::READY != 0
   }

   fn key(&self) -> usize {
      self.0.as_ptr() as usize
   }

   fn unpark_all(&self) {
      // SAFETY: `key` is the address of our own state word, the same key every
      // parked caller used.
      unsafe {
         parking_lot_core::unpark_all(self.key(), DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks the caller until the state word moves away from `seen`.
   ///
   /// Wakeups may be spurious; callers always re-run `claim_step`.
   fn park(&self, seen: u8) {
      // SAFETY: see `unpark_all`.
      unsafe {
         let _ = parking_lot_core::park(
            self.key(),
            || self.0.load(Ordering::Acquire) == seen,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
   }

   /// Publishes the instance: sets `READY`, clears `BUSY`/`PARKED`, bumps the
   /// generation and wakes parked callers.
   ///
   /// Must only be called by the owner of the construction slot, after the
   /// value has been written.
   fn publish(&self) {
      let state = self.0.load(Ordering::Relaxed);
      let previous = self.0.swap(Self::READY | Self::next_generation(state), Ordering::Release);
      if previous & Self::PARKED != 0 {
         self.unpark_all();
      }
   }

   /// Returns the state to pending, bumps the generation and wakes parked
   /// callers so one of them can retry construction.
   ///
   /// Returns `true` if the instance had been published.
   ///
   /// Called by a dropped [`InitGuard`] (failed or unwound construction) or
   /// through `&mut` access when the cell is reset.
   pub(crate) fn rearm(&self) -> bool {
      let state = self.0.load(Ordering::Relaxed);
      let previous = self.0.swap(Self::next_generation(state), Ordering::AcqRel);
      if previous & Self::PARKED != 0 {
         self.unpark_all();
      }
      previous & Self::READY != 0
   }

   /// One non-blocking attempt at the construction slot.
   ///
   /// - `Ok(None)`: the instance is already published.
   /// - `Ok(Some(guard))`: the caller now owns the construction slot.
   /// - `Err(state)`: someone else is constructing; `state` is the value to
   ///   park on. Unless `nowait` is set, `PARKED` has been raised in it.
   fn claim_step(&self, nowait: bool) -> Result<Option<InitGuard<'_>>, u8> {
      loop {
         let state = self.0.load(Ordering::Acquire);
         if state & Self::READY != 0 {
            return Ok(None);
         }

         if state & Self::BUSY == 0 {
            match self.0.compare_exchange_weak(
               state,
               state | Self::BUSY,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Ok(Some(InitGuard { state: self })),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }

         if nowait || state & Self::PARKED != 0 {
            return Err(state);
         }
         let parked = state | Self::PARKED;
         match self
            .0
            .compare_exchange_weak(state, parked, Ordering::Relaxed, Ordering::Relaxed)
         {
            Ok(_) => return Err(parked),
            Err(_) => std::hint::spin_loop(),
         }
      }
   }

   /// Takes the construction slot, parking while another caller holds it.
   ///
   /// Returns `None` once the instance is published, either before the call
   /// or by the caller that held the slot while we were parked.
   pub(crate) fn claim(&self) -> Option<InitGuard<'_>> {
      loop {
         match self.claim_step(false) {
            Ok(slot) => return slot,
            Err(seen) => self.park(seen),
         }
      }
   }

   /// Async counterpart of [`claim`](Self::claim).
   ///
   /// Yields to the runtime while the slot is busy. On a multi-threaded tokio
   /// runtime it eventually parks inside `block_in_place`; on a current-thread
   /// runtime it keeps yielding so the slot holder can make progress.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   pub(crate) async fn claim_async(&self) -> Option<InitGuard<'_>> {
      let mut rounds = 0u32;
      loop {
         let seen = match self.claim_step(true) {
            Ok(slot) => return slot,
            Err(seen) => seen,
         };

         if rounds >= Self::ASYNC_SPIN_ROUNDS && can_block_in_place() {
            #[cfg(feature = "async-tokio-mt")]
            return tokio::task::block_in_place(|| self.claim());
         }
         rounds = rounds.saturating_add(1);

         for _ in 0..Self::ASYNC_YIELDS {
            tokio::task::yield_now().await;
            if self.0.load(Ordering::Relaxed) != seen {
               break;
            }
         }
      }
   }

   /// Without an async runtime there is nothing to yield to, so this blocks.
   #[cfg(not(any(feature = "async-tokio", feature = "async-tokio-mt")))]
   pub(crate) async fn claim_async(&self) -> Option<InitGuard<'_>> {
      self.claim()
   }
}

#[cfg(feature = "async-tokio-mt")]
fn can_block_in_place() -> bool {
   use tokio::runtime::{Handle, RuntimeFlavor};

   Handle::try_current().is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
}

#[cfg(all(feature = "async-tokio", not(feature = "async-tokio-mt")))]
fn can_block_in_place() -> bool {
   false
}

/// Ownership of the construction slot.
///
/// Dropping the guard without calling [`publish`](Self::publish) re-arms the
/// cell, which is what happens when a constructor returns an error, panics,
/// or its future is dropped.
pub(crate) struct InitGuard<'a> {
   state: &'a InitState,
}

impl InitGuard<'_> {
   /// Marks the instance as published and wakes every parked caller.
   ///
   /// The value must already be written.
   #[inline]
   pub(crate) fn publish(self) {
      self.state.publish();
      mem::forget(self);
   }
}

impl Drop for InitGuard<'_> {
   #[inline]
   fn drop(&mut self) {
      self.state.rearm();
   }
}
