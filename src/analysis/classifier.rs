use serde::{Deserialize, Serialize};

use crate::Post;

pub const DEFAULT_VIRAL_THRESHOLD: u64 = 100_000;

/// Inclusive: a post sitting exactly on the threshold counts as viral.
pub fn is_viral(impressions: u64, threshold: Option<u64>) -> bool {
    impressions >= threshold.unwrap_or(DEFAULT_VIRAL_THRESHOLD)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViralClassifier {
    pub default_threshold: u64,
}

impl Default for ViralClassifier {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_VIRAL_THRESHOLD,
        }
    }
}

impl ViralClassifier {
    pub fn new(default_threshold: u64) -> Self {
        Self { default_threshold }
    }

    pub fn threshold_for(&self, post: &Post) -> u64 {
        post.viral_threshold.unwrap_or(self.default_threshold)
    }

    pub fn classify(&self, post: &Post) -> bool {
        is_viral(post.impressions, Some(self.threshold_for(post)))
    }

    pub fn partition<'a>(&self, posts: &'a [Post]) -> (Vec<&'a Post>, Vec<&'a Post>) {
        posts.iter().partition(|post| self.classify(post))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_applies_without_override() {
        assert!(!is_viral(99_999, None));
        assert!(is_viral(100_000, None));
    }

    #[test]
    fn per_post_threshold_wins_over_default() {
        let classifier = ViralClassifier::new(1_000);
        let mut post = Post::new("1", "hello");
        post.impressions = 5_000;
        assert!(classifier.classify(&post));

        post.viral_threshold = Some(10_000);
        assert!(!classifier.classify(&post));
    }
}
