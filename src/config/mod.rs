//! Configuration module for job scraping
//!
//! This module provides the `ScrapeConfig` input object, its type-safe
//! builder, and the `SiteProfile` that carries every site-specific selector
//! and key path as data.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod site_profile;
pub mod types;
pub mod validation;

// Re-exports for public API
pub use builder::{ScrapeConfigBuilder, WithSearch};
pub use site_profile::SiteProfile;
pub use types::{ProxyConfiguration, ScrapeConfig, SortBy};
