//! Optimal posting time analysis.
//!
//! Buckets historical posts by weekday and hour (UTC), ranks the buckets by
//! average engagement and recommends the best slots with enough samples
//! behind them.

use crate::analytics::aggregate::{bucket_by, sort_by_score_desc, EngagementTally};
use crate::analytics::{PostAnalytics, Service};
use crate::core::{now, Timestamp};
use crate::plugin::{
    config_value, ConfigField, Plugin, PluginCategory, PluginError, PluginExecutionContext,
    PluginInfo, PluginResult,
};
use async_trait::async_trait;
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const PLUGIN_ID: &str = "optimal-timing";

/// Default minimum number of posts required for analysis.
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 10;
/// Default minimum confidence for a recommendation.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
/// Samples at which a slot reaches full confidence.
const CONFIDENCE_SATURATION: f64 = 10.0;
const MAX_RECOMMENDATIONS: usize = 10;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A recommended posting slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotRecommendation {
    /// 0 = Sunday
    pub day_of_week: u8,
    pub hour: u8,
    pub engagement_score: f64,
    pub confidence: f64,
    pub sample_size: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStat {
    pub day_of_week: u8,
    pub day_name: String,
    pub average_engagement: f64,
    pub post_count: usize,
    /// 1 = best
    pub rank: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourStat {
    pub hour: u8,
    pub average_engagement: f64,
    pub post_count: usize,
    /// 1 = best
    pub rank: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub best_days: Vec<DayStat>,
    pub best_hours: Vec<HourStat>,
}

/// Full optimal timing report for a profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalTimingAnalysis {
    pub profile_id: String,
    pub service: Service,
    pub recommendations: Vec<TimeSlotRecommendation>,
    pub analysis: TimingBreakdown,
    /// Mean confidence of the recommendations, 0 when there are none
    pub confidence: f64,
    pub last_updated: Timestamp,
}

/// Weekday (0 = Sunday) and hour of a post.
pub type TimeSlot = (u8, u8);

fn day_of(post: &PostAnalytics) -> u8 {
    post.published_at.weekday().num_days_from_sunday() as u8
}

fn hour_of(post: &PostAnalytics) -> u8 {
    post.published_at.hour() as u8
}

/// Engagement per (weekday, hour) slot, in first-seen order.
pub fn analyze_time_slots(posts: &[PostAnalytics]) -> Vec<(TimeSlot, EngagementTally)> {
    bucket_by(posts, |post| (day_of(post), hour_of(post)))
}

/// Weekdays ranked by average engagement.
pub fn analyze_day_patterns(posts: &[PostAnalytics]) -> Vec<DayStat> {
    let mut stats: Vec<DayStat> = bucket_by(posts, day_of)
        .into_iter()
        .map(|(day, tally)| DayStat {
            day_of_week: day,
            day_name: DAY_NAMES[usize::from(day) % 7].to_string(),
            average_engagement: tally.average(),
            post_count: tally.count,
            rank: 0,
        })
        .collect();

    sort_by_score_desc(&mut stats, |s| s.average_engagement);
    for (i, stat) in stats.iter_mut().enumerate() {
        stat.rank = i + 1;
    }
    stats
}

/// Hours of the day ranked by average engagement.
pub fn analyze_hour_patterns(posts: &[PostAnalytics]) -> Vec<HourStat> {
    let mut stats: Vec<HourStat> = bucket_by(posts, hour_of)
        .into_iter()
        .map(|(hour, tally)| HourStat {
            hour,
            average_engagement: tally.average(),
            post_count: tally.count,
            rank: 0,
        })
        .collect();

    sort_by_score_desc(&mut stats, |s| s.average_engagement);
    for (i, stat) in stats.iter_mut().enumerate() {
        stat.rank = i + 1;
    }
    stats
}

/// Top slots whose confidence meets `confidence_threshold`, best first.
pub fn generate_recommendations(
    slots: &[(TimeSlot, EngagementTally)],
    confidence_threshold: f64,
) -> Vec<TimeSlotRecommendation> {
    let mut recommendations: Vec<TimeSlotRecommendation> = slots
        .iter()
        .filter_map(|&((day_of_week, hour), tally)| {
            let confidence = (tally.count as f64 / CONFIDENCE_SATURATION).min(1.0);
            (confidence >= confidence_threshold).then(|| TimeSlotRecommendation {
                day_of_week,
                hour,
                engagement_score: tally.average(),
                confidence,
                sample_size: tally.count,
            })
        })
        .collect();

    sort_by_score_desc(&mut recommendations, |r| r.engagement_score);
    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

/// Mean confidence across recommendations.
pub fn overall_confidence(recommendations: &[TimeSlotRecommendation]) -> f64 {
    if recommendations.is_empty() {
        return 0.0;
    }
    recommendations.iter().map(|r| r.confidence).sum::<f64>() / recommendations.len() as f64
}

/// Recommends posting slots from historical engagement.
pub struct OptimalTimingPlugin {
    info: PluginInfo,
}

impl OptimalTimingPlugin {
    pub fn new() -> Self {
        let info = PluginInfo::new(
            PLUGIN_ID,
            "Optimal Timing Analyzer",
            "1.0.0",
            PluginCategory::Optimization,
        )
        .with_description("Analyzes historical post performance to recommend optimal posting times")
        .with_author("postlens")
        .requires_auth()
        .with_option(
            "minSampleSize",
            ConfigField::number("Minimum Sample Size", true)
                .with_description("Minimum number of posts required for analysis"),
        )
        .with_option(
            "confidenceThreshold",
            ConfigField::number("Confidence Threshold", true)
                .with_description("Minimum confidence score for recommendations"),
        )
        .with_default("minSampleSize", json!(DEFAULT_MIN_SAMPLE_SIZE))
        .with_default("confidenceThreshold", json!(DEFAULT_CONFIDENCE_THRESHOLD));

        Self { info }
    }

    /// Run the analysis and return the typed report.
    pub async fn analyze(&self, ctx: &PluginExecutionContext) -> PluginResult<OptimalTimingAnalysis> {
        let profile_id = ctx
            .profile_id
            .as_deref()
            .ok_or_else(|| PluginError::msg("Profile ID is required"))?;
        let api = ctx
            .api_client
            .as_ref()
            .ok_or_else(|| PluginError::msg("API client is required for optimal timing analysis"))?;

        let config = self.info.resolve_config(&ctx.config);
        let min_sample_size =
            config_value::<usize>(&config, "minSampleSize").unwrap_or(DEFAULT_MIN_SAMPLE_SIZE);
        let confidence_threshold = config_value::<f64>(&config, "confidenceThreshold")
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);

        let posts = api.analytics().posts(profile_id, &ctx.post_query()).await?;
        if posts.len() < min_sample_size {
            return Err(PluginError::msg(format!(
                "Insufficient data: {} posts, minimum {} required",
                posts.len(),
                min_sample_size
            )));
        }

        let slots = analyze_time_slots(&posts);
        let recommendations = generate_recommendations(&slots, confidence_threshold);
        let profile = api.profiles().get(profile_id).await?;

        tracing::debug!(
            profile_id,
            posts = posts.len(),
            recommendations = recommendations.len(),
            "Optimal timing analysis complete"
        );

        Ok(OptimalTimingAnalysis {
            profile_id: profile_id.to_string(),
            service: profile.service,
            confidence: overall_confidence(&recommendations),
            recommendations,
            analysis: TimingBreakdown {
                best_days: analyze_day_patterns(&posts),
                best_hours: analyze_hour_patterns(&posts),
            },
            last_updated: now(),
        })
    }
}

impl Default for OptimalTimingPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for OptimalTimingPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    async fn initialize(&self, ctx: &PluginExecutionContext) -> PluginResult<()> {
        if ctx.profile_id.is_none() {
            return Err(PluginError::msg(
                "Profile ID is required for optimal timing analysis",
            ));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &PluginExecutionContext) -> PluginResult<serde_json::Value> {
        let analysis = self.analyze(ctx).await?;
        Ok(serde_json::to_value(analysis).map_err(crate::core::Error::from)?)
    }
}
