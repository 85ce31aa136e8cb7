//! Core types, state machines and trait seams for the GlobalCart client.
//!
//! This crate is free of HTTP and database dependencies. Persistence comes in
//! through [`storage::KeyValueStore`] and the remote API through
//! [`api::StorefrontApi`]; both are injected so every machine can be driven
//! against in-memory fakes.

// Native `async fn` in traits; the trait signatures spell out `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod driver;
pub mod error;
pub mod model;
pub mod money;
pub mod orders;
pub mod storage;
pub mod validate;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
