//! Credential and token domain models for the relay.

pub mod credentials;
pub mod token;

pub use credentials::*;
pub use token::*;
