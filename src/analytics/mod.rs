//! Analytics Module
//!
//! Provides the data side of the engine:
//! - Post and profile data model
//! - The injected data-access capability
//! - Bucketing and ranking helpers

pub mod aggregate;
pub mod client;
pub mod types;

pub use client::{AnalyticsApi, ApiClient, InMemoryApiClient, ProfilesApi};
pub use types::{PostAnalytics, PostMetrics, PostQuery, Profile, Service};
