//! Glossa - a streaming chat client for term explanations
//!
//! This library exposes modules for use by the `glossa` binary and in
//! integration tests.

pub mod adapters;
pub mod backend;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod session;
pub mod sse;
pub mod traits;
