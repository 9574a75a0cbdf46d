use serde::{Deserialize, Serialize};

use crate::analysis::classifier::ViralClassifier;
use crate::analysis::stats::{
    char_count, content_length, engagement_rate, extract_hook, frequency_table, mean,
    FrequencyEntry,
};
use crate::{ContentType, Post, PostFormat};

pub const DEFAULT_SAMPLE_HOOKS: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub avg_impressions: f64,
    pub avg_engagement_rate: f64,
    pub formats: Vec<FrequencyEntry<PostFormat>>,
    pub content_types: Vec<FrequencyEntry<ContentType>>,
    pub avg_content_length: f64,
    pub avg_char_count: f64,
    pub sample_hooks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub total_posts: usize,
    pub default_threshold: u64,
    pub viral: GroupStats,
    pub normal: GroupStats,
}

#[derive(Debug, Clone)]
pub struct PatternAggregator {
    classifier: ViralClassifier,
    hook_limit: usize,
}

impl Default for PatternAggregator {
    fn default() -> Self {
        Self::new(ViralClassifier::default(), DEFAULT_SAMPLE_HOOKS)
    }
}

impl PatternAggregator {
    pub fn new(classifier: ViralClassifier, hook_limit: usize) -> Self {
        Self {
            classifier,
            hook_limit,
        }
    }

    pub fn aggregate(&self, posts: &[Post]) -> PatternAnalysis {
        let (viral, normal) = self.classifier.partition(posts);

        PatternAnalysis {
            total_posts: posts.len(),
            default_threshold: self.classifier.default_threshold,
            viral: self.group_stats(&viral),
            normal: self.group_stats(&normal),
        }
    }

    fn group_stats(&self, posts: &[&Post]) -> GroupStats {
        if posts.is_empty() {
            return GroupStats::default();
        }

        let impressions: Vec<f64> = posts.iter().map(|post| post.impressions as f64).collect();
        let engagement: Vec<f64> = posts.iter().map(|post| engagement_rate(post)).collect();
        let lengths: Vec<f64> = posts
            .iter()
            .map(|post| content_length(&post.content) as f64)
            .collect();
        let chars: Vec<f64> = posts
            .iter()
            .map(|post| char_count(&post.content) as f64)
            .collect();

        GroupStats {
            count: posts.len(),
            avg_impressions: mean(&impressions),
            avg_engagement_rate: mean(&engagement),
            formats: frequency_table(posts.iter().map(|post| post.format)),
            content_types: frequency_table(posts.iter().map(|post| post.content_type)),
            avg_content_length: mean(&lengths),
            avg_char_count: mean(&chars),
            sample_hooks: self.sample_hooks(posts),
        }
    }

    fn sample_hooks(&self, posts: &[&Post]) -> Vec<String> {
        let mut ranked: Vec<&Post> = posts.to_vec();
        ranked.sort_by(|a, b| b.impressions.cmp(&a.impressions));
        ranked
            .into_iter()
            .filter_map(|post| extract_hook(&post.content))
            .take(self.hook_limit)
            .collect()
    }
}
