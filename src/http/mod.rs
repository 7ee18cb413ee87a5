//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → request.rs (request ID, tracing span)
//!     → security headers → CORS → cookies
//!     → body.rs (JSON stage, URL-encoded stage)
//!     → /health, /test or a mounted /api route group
//!     → error handler (unmatched routes, AppError, panics)
//! ```

pub mod body;
pub mod request;
pub mod server;
pub mod state;

pub use body::ParsedBody;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
pub use state::AppState;
