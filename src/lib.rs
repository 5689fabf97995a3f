pub mod acquire;
pub mod app;
pub mod board;
pub mod cache;
pub mod config;
pub mod errors;
pub mod github;
pub mod handlers;
pub mod labels;
pub mod mock;
pub mod models;
pub mod progress;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::DashboardConfig;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
