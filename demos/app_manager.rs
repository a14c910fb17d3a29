use poly_singleton::app::AppManager;
use poly_singleton::Singleton;

fn main() {
   let manager = AppManager::instance();

   manager.log("Application started.");

   let db_url = manager.config("db.url").unwrap_or("<not configured>");
   manager.log(&format!("Database URL: {db_url}"));

   assert!(std::ptr::eq(manager, AppManager::instance()));
}
