//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! hyper connection (net/listener.rs)
//!     → server.rs (HandlerSet → axum Router + tower-http layers)
//!     → handlers.rs (route handlers)
//!     → items.rs (read-only item catalog)
//! ```

pub mod handlers;
pub mod items;
pub mod server;

pub use items::{Item, ItemCatalog};
pub use server::HandlerSet;
