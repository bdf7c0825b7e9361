#[cfg(test)]
pub(crate) mod gated;
pub mod memory;
pub mod redis;
pub mod session_store;
pub mod store;

pub use memory::MemoryStore;
pub use self::redis::{create_redis_client, RedisStore};
pub use session_store::{Preferences, SessionStore};
pub use store::{KeyValueStore, StoreKey};
