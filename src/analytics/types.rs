//! Social post analytics data model.

use crate::core::Timestamp;
use serde::{Deserialize, Serialize};

/// Social platform a profile or post belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Twitter,
    Facebook,
    Linkedin,
    Instagram,
    Pinterest,
    Tiktok,
    Mastodon,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Service::Twitter => "twitter",
            Service::Facebook => "facebook",
            Service::Linkedin => "linkedin",
            Service::Instagram => "instagram",
            Service::Pinterest => "pinterest",
            Service::Tiktok => "tiktok",
            Service::Mastodon => "mastodon",
        };
        f.write_str(name)
    }
}

/// Interaction counters for a single post. Missing counters are zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostMetrics {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub clicks: u64,
}

impl PostMetrics {
    /// Sum of all interaction counters.
    pub fn total(&self) -> u64 {
        self.likes + self.comments + self.shares + self.clicks
    }
}

/// Measured performance of one published post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAnalytics {
    /// Post identifier
    pub post_id: String,
    /// When the post went out
    pub published_at: Timestamp,
    /// Platform the post was published to
    pub service: Service,
    /// Engagement rate, typically within 0..1
    pub engagement_rate: f64,
    /// Unique accounts reached
    pub reach: u64,
    /// Total impressions
    pub impressions: u64,
    /// Interaction breakdown
    #[serde(default)]
    pub metrics: PostMetrics,
}

impl PostAnalytics {
    /// Create a post record with zeroed reach, impressions and metrics.
    pub fn new(post_id: &str, published_at: Timestamp, service: Service, engagement_rate: f64) -> Self {
        Self {
            post_id: post_id.to_string(),
            published_at,
            service,
            engagement_rate,
            reach: 0,
            impressions: 0,
            metrics: PostMetrics::default(),
        }
    }

    /// Set reach and impressions.
    pub fn with_audience(mut self, reach: u64, impressions: u64) -> Self {
        self.reach = reach;
        self.impressions = impressions;
        self
    }

    /// Set interaction counters.
    pub fn with_metrics(mut self, metrics: PostMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

/// A social profile as returned by the profiles API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub service: Service,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_username: Option<String>,
}

impl Profile {
    pub fn new(id: &str, service: Service) -> Self {
        Self {
            id: id.to_string(),
            service,
            formatted_username: None,
        }
    }
}

/// Date bounds for a post analytics query. Both ends are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PostQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
}

impl PostQuery {
    /// Whether `at` falls inside the query bounds.
    pub fn contains(&self, at: &Timestamp) -> bool {
        self.start.map_or(true, |start| *at >= start) && self.end.map_or(true, |end| *at <= end)
    }
}
