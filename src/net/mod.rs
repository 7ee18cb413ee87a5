//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! HOST:PORT from config
//!     → listener.rs (bind, classify failures)
//!     → Hand off to the HTTP layer (axum::serve)
//! ```
//!
//! # Design Decisions
//! - A bind failure is fatal; the server never starts half-bound
//! - Connection handling and limits belong to hyper via axum

pub mod listener;

pub use listener::{bind, ListenerError};
