//! Shared configuration, errors, and domain types for the kieubot
//! retrieval stack.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `KIEU_*` env
//! vars into a typed [`config::Settings`]. The error taxonomy in [`error`]
//! is deliberately small: config problems are fatal at startup, everything
//! else propagates untouched to the caller.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
