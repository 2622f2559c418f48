pub mod broadcast;
pub mod config;
pub mod error;
pub mod records;

pub use broadcast::*;
pub use config::*;
pub use error::*;
pub use records::*;
