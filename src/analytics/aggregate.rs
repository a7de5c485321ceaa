//! Engagement bucketing and ranking shared by the analytic plugins.

use crate::analytics::types::PostAnalytics;
use std::collections::HashMap;
use std::hash::Hash;

/// Running engagement total for one bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngagementTally {
    /// Sum of engagement rates
    pub engagement: f64,
    /// Number of posts
    pub count: usize,
}

impl EngagementTally {
    pub fn add(&mut self, engagement_rate: f64) {
        self.engagement += engagement_rate;
        self.count += 1;
    }

    /// Mean engagement rate, zero for an empty tally.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.engagement / self.count as f64
        }
    }
}

/// Group posts by `key`, keeping buckets in first-seen order.
pub fn bucket_by<K, F>(posts: &[PostAnalytics], key: F) -> Vec<(K, EngagementTally)>
where
    K: Eq + Hash + Copy,
    F: Fn(&PostAnalytics) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, EngagementTally)> = Vec::new();

    for post in posts {
        let k = key(post);
        let slot = *index.entry(k).or_insert_with(|| {
            buckets.push((k, EngagementTally::default()));
            buckets.len() - 1
        });
        buckets[slot].1.add(post.engagement_rate);
    }

    buckets
}

/// Stable sort by descending score; equal scores keep their input order.
pub fn sort_by_score_desc<T, F>(items: &mut [T], score: F)
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}
