pub mod broadcaster;
pub mod chat_registry;
pub mod memory_store;
pub mod migrations;
pub mod pg_store;
pub mod sessions;
pub mod store;
pub mod sync;

pub use broadcaster::*;
pub use chat_registry::*;
pub use memory_store::*;
pub use migrations::*;
pub use pg_store::*;
pub use sessions::*;
pub use store::*;
pub use sync::*;
