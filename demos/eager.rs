use poly_singleton::Eager;

/// Built before `main` runs; there is nothing to race on.
struct Limits {
   max_connections: u32,
   max_payload: usize,
}

static LIMITS: Eager<Limits> = Eager::new(Limits {
   max_connections: 64,
   max_payload: 1 << 20,
});

fn main() {
   let first = LIMITS.instance();
   let second = LIMITS.instance();

   println!(
      "limits: {} connections, {} byte payloads",
      first.max_connections, first.max_payload
   );
   println!("same instance: {}", std::ptr::eq(first, second));
}
