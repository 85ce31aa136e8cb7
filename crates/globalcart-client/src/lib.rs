//! HTTP client for the GlobalCart API.
//!
//! [`ApiClient`] owns the transport: URL building, JSON bodies, error
//! extraction and the admin credential header. The remaining modules add
//! typed endpoint methods on top of it, grouped by surface.

pub mod account;
pub mod addresses;
pub mod admin;
pub mod catalog;
pub mod client;
pub mod error;
pub mod events;
pub mod orders;
pub mod storefront;
pub mod wishlist;

pub use admin::AdminClient;
pub use client::{ApiClient, ApiConfig, RequestOptions};
pub use error::{RequestError, Result};
