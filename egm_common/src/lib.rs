//! EGM Common Library
//!
//! This crate provides the shared types, configuration loading utilities and
//! collaborator traits for the EGM workspace.
//!
//! # Module Structure
//!
//! - [`hal`] - Hardware model, controller description, motion data and traits
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Connection budgets, parameter keys and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use egm_common::prelude::*;
//! use egm_common::config::{ConfigLoader, SharedConfig};
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
