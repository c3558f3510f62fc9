//! Aranya library
//!
//! Wildlife incident reporting client: session and role handling, complaint
//! submission with file uploads, and report review. The desktop shell is
//! built on top of this with the `desktop` feature.

pub mod app;
pub mod auth;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod navigation;
pub mod services;
pub mod storage;
