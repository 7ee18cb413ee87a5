//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route groups (supplied by the embedding crate)
//!     → router.rs (ApiRoutes: one Router<AppState> per group)
//!     → mount() nests each group under its /api prefix
//!     → merged into the server router ahead of the 404 fallback
//! ```
//!
//! # Design Decisions
//! - Route groups receive AppState; none reach for global state
//! - The bootstrap owns prefixes, the groups own everything below them

pub mod router;

pub use router::{group_for_path, ApiRoutes};
