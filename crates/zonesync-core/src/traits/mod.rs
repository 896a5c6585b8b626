//! Core traits for zonesync
//!
//! This module defines the abstract interfaces that provider implementations
//! must follow.
//!
//! - [`ZoneProvider`]: List zones and records, replace and delete record sets

pub mod zone_provider;

pub use zone_provider::{ZoneProvider, ZoneProviderFactory};
