use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use poly_singleton::Lazy;
use tokio::time::{sleep, Duration};

type Connect = Pin<Box<dyn Future<Output = String> + Send>>;

static COUNTER: AtomicUsize = AtomicUsize::new(0);
static CONNECTION: Lazy<String, fn() -> Connect> = Lazy::new(connect);

fn connect() -> Connect {
   Box::pin(async {
      // Runs only once, however many tasks ask
      COUNTER.fetch_add(1, Ordering::Relaxed);
      println!("Connecting...");
      sleep(Duration::from_millis(50)).await;
      "connection #1".to_string()
   })
}

#[tokio::main]
async fn main() {
   let tasks: Vec<_> = (0..5)
      .map(|_| {
         tokio::spawn(async {
            println!("Task uses: {}", CONNECTION.instance_async().await);
         })
      })
      .collect();

   for t in tasks {
      t.await.unwrap();
   }

   assert_eq!(COUNTER.load(Ordering::Relaxed), 1);
   println!("Final connection: {}", CONNECTION.instance_async().await);
}
