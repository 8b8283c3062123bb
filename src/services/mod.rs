//! Domain services called by the HTTP routes.
//!
//! Functions take the store as `&dyn DocumentStore` so the same code runs
//! against Postgres in production and the in-memory store in tests.

pub mod affiliate;
pub mod items;
pub mod lists;
pub mod short_url;
pub mod suggestions;
pub mod users;
