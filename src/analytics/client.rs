//! Data-access capability injected into plugins.
//!
//! Plugins never talk to a social platform directly. They receive an
//! [`ApiClient`] through the execution context and go through its
//! `analytics()` and `profiles()` sub-capabilities.

use crate::analytics::types::{PostAnalytics, PostQuery, Profile};
use crate::core::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Post analytics endpoint.
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    /// Fetch per-post analytics for a profile within the query bounds.
    async fn posts(&self, profile_id: &str, query: &PostQuery) -> Result<Vec<PostAnalytics>>;
}

/// Profiles endpoint.
#[async_trait]
pub trait ProfilesApi: Send + Sync {
    /// Fetch a single profile.
    async fn get(&self, profile_id: &str) -> Result<Profile>;
}

/// The capability bundle handed to plugins.
pub trait ApiClient: Send + Sync {
    fn analytics(&self) -> &dyn AnalyticsApi;

    fn profiles(&self) -> &dyn ProfilesApi;
}

#[derive(Default)]
struct ProfileFixture {
    profile: Option<Profile>,
    posts: Vec<PostAnalytics>,
}

/// In-memory API client backed by fixtures.
///
/// Serves as the mock-mode client and as the data source in tests.
#[derive(Default)]
pub struct InMemoryApiClient {
    fixtures: RwLock<HashMap<String, ProfileFixture>>,
}

impl InMemoryApiClient {
    /// Create an empty client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile.
    pub fn with_profile(self, profile: Profile) -> Self {
        self.insert_profile(profile);
        self
    }

    /// Add posts for a profile.
    pub fn with_posts(self, profile_id: &str, posts: Vec<PostAnalytics>) -> Self {
        self.insert_posts(profile_id, posts);
        self
    }

    /// Insert or replace a profile.
    pub fn insert_profile(&self, profile: Profile) {
        let id = profile.id.clone();
        self.write().entry(id).or_default().profile = Some(profile);
    }

    /// Append posts for a profile.
    pub fn insert_posts(&self, profile_id: &str, posts: Vec<PostAnalytics>) {
        self.write().entry(profile_id.to_string()).or_default().posts.extend(posts);
    }

    // Poisoning is ignored: every write is a single map update.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ProfileFixture>> {
        self.fixtures.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ProfileFixture>> {
        self.fixtures.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AnalyticsApi for InMemoryApiClient {
    async fn posts(&self, profile_id: &str, query: &PostQuery) -> Result<Vec<PostAnalytics>> {
        let fixtures = self.read();
        let fixture = fixtures
            .get(profile_id)
            .ok_or_else(|| Error::ProfileNotFound(profile_id.to_string()))?;

        Ok(fixture
            .posts
            .iter()
            .filter(|post| query.contains(&post.published_at))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfilesApi for InMemoryApiClient {
    async fn get(&self, profile_id: &str) -> Result<Profile> {
        let fixtures = self.read();
        fixtures
            .get(profile_id)
            .and_then(|fixture| fixture.profile.clone())
            .ok_or_else(|| Error::ProfileNotFound(profile_id.to_string()))
    }
}

impl ApiClient for InMemoryApiClient {
    fn analytics(&self) -> &dyn AnalyticsApi {
        self
    }

    fn profiles(&self) -> &dyn ProfilesApi {
        self
    }
}
