pub mod aggregate;
pub mod classifier;
pub mod insights;
pub mod stats;

use serde::{Deserialize, Serialize};

use crate::Post;

pub use aggregate::{GroupStats, PatternAggregator, PatternAnalysis, DEFAULT_SAMPLE_HOOKS};
pub use classifier::{is_viral, ViralClassifier, DEFAULT_VIRAL_THRESHOLD};
pub use insights::{InsightGenerator, Insights, LengthBand};
pub use stats::{
    char_count, content_length, engagement_rate, extract_hook, frequency_table, mean,
    FrequencyEntry,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub viral_threshold: u64,
    pub sample_hook_limit: usize,
    pub length_band_low: f64,
    pub length_band_high: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            viral_threshold: DEFAULT_VIRAL_THRESHOLD,
            sample_hook_limit: DEFAULT_SAMPLE_HOOKS,
            length_band_low: 0.8,
            length_band_high: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinningPatternReport {
    pub analysis: PatternAnalysis,
    pub insights: Insights,
}

pub fn analyze_posts(posts: &[Post], config: &AnalysisConfig) -> WinningPatternReport {
    let aggregator = PatternAggregator::new(
        ViralClassifier::new(config.viral_threshold),
        config.sample_hook_limit,
    );
    let analysis = aggregator.aggregate(posts);
    let insights =
        InsightGenerator::new(config.length_band_low, config.length_band_high).generate(&analysis);

    WinningPatternReport { analysis, insights }
}
