//! HTTP adapter for the sheet bridge
//!
//! axum handlers, response conversions and the server loop.

pub mod handlers;
pub mod response;
pub mod server;
pub mod upload;

pub use response::ApiResponse;
pub use server::{build_router, run_api_server, AppState, ServerConfig};
pub use upload::UploadedFiles;
