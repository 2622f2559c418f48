pub mod cli;
pub mod server;

pub use cli::{Cli, Commands};
pub use invite_control::{MemberStore, MemoryStore, PgStore};
pub use invite_dispatch::AppState;
pub use invite_models::{BotError, Config};
