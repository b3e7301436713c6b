//! Request-for-change desk: the RFC lifecycle engine, its storage and the
//! read-side projections used by the `rfcdesk` CLI.

pub mod clock;
pub mod command;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod signature;
pub mod store;
pub mod view;

pub use engine::{Engine, Policy};
pub use error::{EngineError, StoreError, ValidationError};
