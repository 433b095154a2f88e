//! Hardware abstraction types shared between the adapter and its host.
//!
//! - [`config`] - Hardware declaration and typed hardware parameters
//! - [`description`] - Canonical robot controller description
//! - [`driver`] - Error taxonomy, lifecycle and collaborator traits
//! - [`types`] - Motion data mirror and interface handles

pub mod config;
pub mod description;
pub mod driver;
pub mod types;
