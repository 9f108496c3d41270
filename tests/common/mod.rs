//! Common test utilities and helpers
//!
//! This module provides shared functionality used across integration tests:
//! - Binary path resolution (via `get_hecbuild_binary`)
//! - Build root fixtures, a scripted command runner and an echo compiler
//!   (via `helpers`)

pub(crate) mod helpers;

// Re-export get_hecbuild_binary for convenient access
#[allow(unused_imports)]
pub(crate) use helpers::get_hecbuild_binary;
