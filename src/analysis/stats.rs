use serde::{Deserialize, Serialize};

use crate::Post;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry<T> {
    pub value: T,
    pub count: usize,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn engagement_rate(post: &Post) -> f64 {
    if post.impressions == 0 {
        return 0.0;
    }
    post.total_engagements() as f64 / post.impressions as f64
}

/// Line count of the post body. A blank body has no lines.
pub fn content_length(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    text.trim_end_matches('\n').split('\n').count()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

pub fn extract_hook(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(2)
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// Counts occurrences and sorts by count, highest first. The sort is stable,
/// so equal counts keep the order in which values were first seen.
pub fn frequency_table<T, I>(values: I) -> Vec<FrequencyEntry<T>>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut table: Vec<FrequencyEntry<T>> = Vec::new();
    for value in values {
        match table.iter_mut().find(|entry| entry.value == value) {
            Some(entry) => entry.count += 1,
            None => table.push(FrequencyEntry { value, count: 1 }),
        }
    }
    table.sort_by(|a, b| b.count.cmp(&a.count));
    table
}
