mod entry;
mod lock;
mod resource;

pub use entry::{CacheEntry, CachePolicy};
pub use lock::{acquire_root_lock, RootLockGuard};
pub use resource::{is_satisfied, ResourceCache};
