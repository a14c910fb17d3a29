use std::sync::atomic::{AtomicUsize, Ordering};

use poly_singleton::Singleton;

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

mod registry {
   use super::{Ordering, CONSTRUCTED};

   pub struct Registry {
      names: Vec<&'static str>,
   }

   impl Registry {
      fn build() -> Self {
         CONSTRUCTED.fetch_add(1, Ordering::Relaxed);
         println!("Building registry...");
         std::thread::sleep(std::time::Duration::from_millis(50));
         Self {
            names: vec!["alpha", "beta", "gamma"],
         }
      }

      pub fn names(&self) -> &[&'static str] {
         &self.names
      }
   }

   poly_singleton::singleton!(lazy Registry => Registry::build);
}

use registry::Registry;

fn main() {
   let threads: Vec<_> = (0..5)
      .map(|i| {
         std::thread::spawn(move || {
            let registry = Registry::instance();
            println!("thread {i} sees {:p}: {:?}", registry, registry.names());
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }

   assert_eq!(CONSTRUCTED.load(Ordering::Relaxed), 1); // Constructor ran only once
   println!("Registry has {} names", Registry::instance().names().len());
}
