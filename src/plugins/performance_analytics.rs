//! Performance summary over a profile's recent posts.

use crate::analytics::aggregate::{bucket_by, EngagementTally};
use crate::analytics::{ApiClient, PostAnalytics, PostQuery, Service};
use crate::plugin::{
    config_value, ConfigField, Plugin, PluginCategory, PluginError, PluginExecutionContext,
    PluginInfo, PluginResult, TimeRange,
};
use async_trait::async_trait;
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

pub const PLUGIN_ID: &str = "performance-analytics";

pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 1;
/// Percentage change below which a trend counts as stable.
const TREND_THRESHOLD_PERCENT: f64 = 5.0;
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Summary window derived from the requested time range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryWindow {
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl std::fmt::Display for SummaryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryWindow::Week => write!(f, "7d"),
            SummaryWindow::Month => write!(f, "30d"),
            SummaryWindow::Quarter => write!(f, "90d"),
            SummaryWindow::Year => write!(f, "1y"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Engagement trend between the older and newer half of the posts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Rounded absolute percentage change
    pub percentage: u64,
}

impl Trend {
    pub fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            percentage: 0,
        }
    }
}

/// Totals across all posts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopMetrics {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub clicks: u64,
    pub reach: u64,
    pub impressions: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformBreakdown {
    pub platform: Service,
    pub post_count: usize,
    pub engagement_rate: f64,
    pub reach: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub profile_id: String,
    pub time_range: SummaryWindow,
    pub total_posts: usize,
    /// Sum of likes, comments, shares and clicks
    pub total_engagement: u64,
    pub average_engagement_rate: f64,
    pub best_performing_post: String,
    /// Best hour, formatted `HH:00`
    pub top_performing_time: String,
    pub top_metrics: TopMetrics,
    pub platform_breakdown: Vec<PlatformBreakdown>,
    pub trending: Trend,
}

/// Map a requested range onto a summary window. Missing bounds mean `30d`.
pub fn determine_time_range(time_range: Option<&TimeRange>) -> SummaryWindow {
    let (start, end) = match time_range.and_then(|r| r.start.zip(r.end)) {
        Some(bounds) => bounds,
        None => return SummaryWindow::Month,
    };

    let millis = (end - start).num_milliseconds();
    // Ceiling division that also holds for negative spans.
    let days = -((-millis).div_euclid(MILLIS_PER_DAY));

    match days {
        d if d <= 7 => SummaryWindow::Week,
        d if d <= 30 => SummaryWindow::Month,
        d if d <= 90 => SummaryWindow::Quarter,
        _ => SummaryWindow::Year,
    }
}

/// Classify the change from `first_avg` to `second_avg`.
pub fn calculate_trend_direction(first_avg: f64, second_avg: f64) -> Trend {
    if first_avg == 0.0 {
        return Trend::stable();
    }

    let change = (second_avg - first_avg) / first_avg * 100.0;
    let direction = if change.abs() < TREND_THRESHOLD_PERCENT {
        TrendDirection::Stable
    } else if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    Trend {
        direction,
        // Halves round toward positive infinity before the sign is dropped.
        percentage: (change + 0.5).floor().abs() as u64,
    }
}

/// Trend between the chronologically older and newer halves of the posts.
pub fn calculate_trending(posts: &[PostAnalytics]) -> Trend {
    if posts.len() < 2 {
        return Trend::stable();
    }

    let mut sorted: Vec<&PostAnalytics> = posts.iter().collect();
    sorted.sort_by_key(|post| post.published_at);
    let (first_half, second_half) = sorted.split_at(sorted.len() / 2);

    calculate_trend_direction(average_rate(first_half), average_rate(second_half))
}

fn average_rate(posts: &[&PostAnalytics]) -> f64 {
    if posts.is_empty() {
        return 0.0;
    }
    posts.iter().map(|p| p.engagement_rate).sum::<f64>() / posts.len() as f64
}

/// Hour with the highest average engagement, as `HH:00`.
pub fn find_top_performing_time(posts: &[PostAnalytics]) -> String {
    let mut best_hour = 0u32;
    let mut best_average = 0.0;

    for (hour, tally) in bucket_by(posts, |post| post.published_at.hour()) {
        let average = tally.average();
        if average > best_average {
            best_average = average;
            best_hour = hour;
        }
    }

    format!("{:02}:00", best_hour)
}

/// Post with the highest engagement rate; the earliest wins a tie.
pub fn find_best_performing_post(posts: &[PostAnalytics]) -> Option<&PostAnalytics> {
    posts.iter().fold(None, |best: Option<&PostAnalytics>, current| match best {
        Some(b) if current.engagement_rate <= b.engagement_rate => Some(b),
        _ => Some(current),
    })
}

pub fn calculate_top_metrics(posts: &[PostAnalytics]) -> TopMetrics {
    posts.iter().fold(TopMetrics::default(), |mut totals, post| {
        totals.likes += post.metrics.likes;
        totals.comments += post.metrics.comments;
        totals.shares += post.metrics.shares;
        totals.clicks += post.metrics.clicks;
        totals.reach += post.reach;
        totals.impressions += post.impressions;
        totals
    })
}

/// Per-platform post count, mean engagement rate and total reach.
pub fn calculate_platform_breakdown(posts: &[PostAnalytics]) -> Vec<PlatformBreakdown> {
    let reach_by_service: HashMap<Service, u64> =
        posts.iter().fold(HashMap::new(), |mut acc, post| {
            *acc.entry(post.service).or_insert(0) += post.reach;
            acc
        });

    bucket_by(posts, |post| post.service)
        .into_iter()
        .map(|(service, tally): (Service, EngagementTally)| PlatformBreakdown {
            platform: service,
            post_count: tally.count,
            engagement_rate: tally.average(),
            reach: reach_by_service.get(&service).copied().unwrap_or(0),
        })
        .collect()
}

/// Build the summary. `posts` must not be empty.
pub fn generate_summary(
    posts: &[PostAnalytics],
    profile_id: &str,
    time_range: Option<&TimeRange>,
) -> PluginResult<AnalyticsSummary> {
    let best = find_best_performing_post(posts)
        .ok_or_else(|| PluginError::msg("No analytics data available for the specified time range"))?;

    Ok(AnalyticsSummary {
        profile_id: profile_id.to_string(),
        time_range: determine_time_range(time_range),
        total_posts: posts.len(),
        total_engagement: posts.iter().map(|p| p.metrics.total()).sum(),
        average_engagement_rate: posts.iter().map(|p| p.engagement_rate).sum::<f64>()
            / posts.len() as f64,
        best_performing_post: best.post_id.clone(),
        top_performing_time: find_top_performing_time(posts),
        top_metrics: calculate_top_metrics(posts),
        platform_breakdown: calculate_platform_breakdown(posts),
        trending: calculate_trending(posts),
    })
}

/// Summarizes post performance for a profile.
pub struct PerformanceAnalyticsPlugin {
    info: PluginInfo,
}

impl PerformanceAnalyticsPlugin {
    pub fn new() -> Self {
        let info = PluginInfo::new(
            PLUGIN_ID,
            "Performance Analytics Pro",
            "1.0.0",
            PluginCategory::Analytics,
        )
        .with_description("Provides comprehensive performance analytics and insights")
        .with_author("postlens")
        .requires_auth()
        .with_option(
            "minSampleSize",
            ConfigField::number("Minimum Sample Size", false)
                .with_description("Minimum number of posts required for analysis")
                .with_default(json!(DEFAULT_MIN_SAMPLE_SIZE)),
        );

        Self { info }
    }

    fn validate_context<'a>(
        &self,
        ctx: &'a PluginExecutionContext,
    ) -> PluginResult<(&'a str, &'a dyn ApiClient)> {
        let profile_id = ctx
            .profile_id
            .as_deref()
            .ok_or_else(|| PluginError::msg("Profile ID is required for performance analytics"))?;
        let api = ctx
            .api_client
            .as_deref()
            .ok_or_else(|| PluginError::msg("API client is required for performance analytics"))?;
        Ok((profile_id, api))
    }

    async fn fetch_posts(
        &self,
        api: &dyn ApiClient,
        profile_id: &str,
        query: &PostQuery,
    ) -> PluginResult<Vec<PostAnalytics>> {
        let posts = api.analytics().posts(profile_id, query).await?;
        if posts.is_empty() {
            return Err(PluginError::msg(
                "No analytics data available for the specified time range",
            ));
        }
        Ok(posts)
    }

    /// Run the analysis and return the typed summary.
    pub async fn summarize(&self, ctx: &PluginExecutionContext) -> PluginResult<AnalyticsSummary> {
        let (profile_id, api) = self.validate_context(ctx)?;
        let posts = self.fetch_posts(api, profile_id, &ctx.post_query()).await?;

        let config = self.info.resolve_config(&ctx.config);
        let min_sample_size = config_value::<usize>(&config, "minSampleSize")
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MIN_SAMPLE_SIZE);
        if posts.len() < min_sample_size {
            return Err(PluginError::msg(format!(
                "Insufficient data: {} posts, minimum {} required",
                posts.len(),
                min_sample_size
            )));
        }

        generate_summary(&posts, profile_id, ctx.time_range.as_ref())
    }
}

impl Default for PerformanceAnalyticsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for PerformanceAnalyticsPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    async fn initialize(&self, ctx: &PluginExecutionContext) -> PluginResult<()> {
        self.validate_context(ctx).map(|_| ())
    }

    async fn execute(&self, ctx: &PluginExecutionContext) -> PluginResult<serde_json::Value> {
        let summary = self.summarize(ctx).await?;
        Ok(serde_json::to_value(summary).map_err(crate::core::Error::from)?)
    }

    async fn validate(&self, ctx: &PluginExecutionContext) -> PluginResult<bool> {
        match self.validate_context(ctx) {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(plugin_id = PLUGIN_ID, error = %e, "Performance analytics validation failed");
                Ok(false)
            }
        }
    }

    async fn cleanup(&self) -> PluginResult<()> {
        tracing::debug!(plugin_id = PLUGIN_ID, "Performance analytics cleanup completed");
        Ok(())
    }
}
