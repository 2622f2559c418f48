pub mod handlers;
pub mod keyboards;
pub mod poller;
pub mod routes;
pub mod state;
pub mod texts;

pub use handlers::handle_update;
pub use poller::run_polling;
pub use routes::*;
pub use state::AppState;
