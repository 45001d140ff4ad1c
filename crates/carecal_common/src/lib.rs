// --- File: crates/carecal_common/src/lib.rs ---

pub mod error; // Error handling
pub mod http; // Axum response mapping
pub mod logging; // Logging utilities

pub use error::{config_error, CarecalError, HttpStatusCode};

pub use http::handle_json_result;

pub use logging::{init, init_from_str, init_with_level, log_result};
