//! Identity core: account registration, password login and bearer token
//! resolution over a pluggable credential store.
//!
//! The crate exposes no transport. A request layer drives it through
//! [`IdentityServicePort`](domain::account::ports::IdentityServicePort) and
//! maps [`AccountError`](domain::account::errors::AccountError) onto its own
//! status codes.

pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod outbound;

pub use domain::account;
pub use outbound::repositories;
