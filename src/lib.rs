//! A proof-of-work ledger node.
//!
//! The [`blockchain`] module is the engine: canonical hashing, Merkle roots,
//! proof of work, chain validation and balance accounting. The [`api`] module
//! exposes it over HTTP.

pub mod api;
pub mod blockchain;
pub mod config;
