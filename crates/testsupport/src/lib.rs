pub mod helpers;
pub mod mock_api;

pub use helpers::*;
pub use mock_api::*;
