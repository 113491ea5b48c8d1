//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`knobs`] — catalog reads (listing, single record, preview)
//! - [`scrape`] — catalog refresh and its status
//! - [`downloads`] — single, batch, and thumbnail downloads
//! - [`settings`] — runtime-mutable download settings
//! - [`system`] — health and OpenAPI spec

mod downloads;
mod knobs;
mod scrape;
mod settings;
mod system;

// Re-export all handlers so `routes::function_name` works from the router
pub use downloads::*;
pub use knobs::*;
pub use scrape::*;
pub use settings::*;
pub use system::*;
