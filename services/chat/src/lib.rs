//! Ask Ray Chat Library Crate
//!
//! Terminal front-end for the Ask Ray conversation widget: configuration,
//! host environment, token acquisition, rendering and the interactive loop.
//! The `askray` binary is a thin wrapper around this library.

pub mod app;
pub mod auth;
pub mod config;
pub mod console;
pub mod host;
pub mod render;
