//! Wavescope App Services
//!
//! Settings and data persistence for the wavescope player.
//! Depends on the `wavescope` engine crate.

pub mod config;
pub mod data;
pub mod error;
