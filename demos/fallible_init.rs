use std::sync::atomic::{AtomicBool, Ordering};

use poly_singleton::Lazy;

static RESOURCE_READY: AtomicBool = AtomicBool::new(false);
static POOL: Lazy<Vec<u32>, fn() -> Result<Vec<u32>, &'static str>> = Lazy::new(open_pool);

fn open_pool() -> Result<Vec<u32>, &'static str> {
   println!(
      "Attempting construction (ready={})...",
      RESOURCE_READY.load(Ordering::SeqCst)
   );
   if RESOURCE_READY.load(Ordering::SeqCst) {
      Ok(vec![1, 2, 3, 4])
   } else {
      Err("resource not ready")
   }
}

fn main() {
   // A failed construction is not remembered
   match POOL.try_instance() {
      Ok(_) => panic!("Should have failed"),
      Err(e) => println!("Caught error: {e}"),
   }
   assert!(!POOL.is_constructed());

   RESOURCE_READY.store(true, Ordering::SeqCst);
   match POOL.try_instance() {
      Ok(pool) => println!("Got pool: {pool:?}"),
      Err(_) => panic!("Should have succeeded"),
   }
   assert!(POOL.is_constructed());

   // Later failures cannot happen: the constructor is never consulted again
   RESOURCE_READY.store(false, Ordering::SeqCst);
   assert_eq!(POOL.try_instance(), Ok(&vec![1, 2, 3, 4]));
}
