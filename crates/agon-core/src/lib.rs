//! Core types and trait definitions for the Agon debate engine.
//!
//! This crate has no HTTP or database dependencies. Validation, the vote
//! state machine and thread reconstruction are pure functions here; storage
//! backends only persist their results.

pub mod argument;
pub mod debate;
pub mod error;
pub mod evidence;
pub mod policy;
pub mod store;
pub mod thread;
pub mod user;
pub mod vote;

pub use error::{Classify, Error, ErrorKind, Result};
