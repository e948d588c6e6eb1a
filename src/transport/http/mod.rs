pub mod router;
pub mod server;
pub mod types;
pub mod handlers {
    pub mod compare;
    pub mod health;
    pub mod model_info;
    pub mod statistics;
}

pub use router::{create_router, ApiDoc};
pub use server::{serve, shutdown_signal};
pub use types::AppState;
