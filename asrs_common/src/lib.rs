//! ASRS Common Library
//!
//! Shared definitions for the ASRS line simulator workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Crane geometry, motion limits and default timings
//! - [`register`] - Register catalog, line namespaces, node ids
//! - [`codes`] - Command and status code catalogs
//! - [`config`] - Configuration loading traits and types
//! - [`error`] - Top-level error type
//! - [`prelude`] - Common re-exports for convenience

pub mod codes;
pub mod config;
pub mod consts;
pub mod error;
pub mod prelude;
pub mod register;
