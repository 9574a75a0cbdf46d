use serde::{Deserialize, Serialize};

use crate::analysis::aggregate::PatternAnalysis;
use crate::{format_float, ContentType, PostFormat};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthBand {
    pub min: f64,
    pub average: f64,
    pub max: f64,
}

impl LengthBand {
    pub fn contains(&self, length: f64) -> bool {
        length >= self.min && length <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insights {
    pub best_format: Option<PostFormat>,
    pub best_content_type: Option<ContentType>,
    pub optimal_length: Option<LengthBand>,
    pub sample_hooks: Vec<String>,
    pub viral_rate: f64,
    pub engagement_lift: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InsightGenerator {
    band_low: f64,
    band_high: f64,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new(0.8, 1.2)
    }
}

impl InsightGenerator {
    /// The band always brackets the average: factors are pinned to either
    /// side of 1.0.
    pub fn new(band_low: f64, band_high: f64) -> Self {
        Self {
            band_low: band_low.clamp(0.0, 1.0),
            band_high: band_high.max(1.0),
        }
    }

    pub fn generate(&self, analysis: &PatternAnalysis) -> Insights {
        let viral = &analysis.viral;
        let normal = &analysis.normal;

        let best_format = viral.formats.first().map(|entry| entry.value);
        let best_content_type = viral.content_types.first().map(|entry| entry.value);

        let optimal_length = if viral.count == 0 {
            None
        } else {
            Some(LengthBand {
                min: viral.avg_content_length * self.band_low,
                average: viral.avg_content_length,
                max: viral.avg_content_length * self.band_high,
            })
        };

        let viral_rate = if analysis.total_posts == 0 {
            0.0
        } else {
            viral.count as f64 / analysis.total_posts as f64
        };

        let engagement_lift = if normal.avg_engagement_rate > 0.0 {
            viral.avg_engagement_rate / normal.avg_engagement_rate
        } else {
            0.0
        };

        let mut insights = Insights {
            best_format,
            best_content_type,
            optimal_length,
            sample_hooks: viral.sample_hooks.clone(),
            viral_rate,
            engagement_lift,
            recommendations: Vec::new(),
        };
        insights.recommendations = build_recommendations(analysis, &insights);
        insights
    }
}

fn build_recommendations(analysis: &PatternAnalysis, insights: &Insights) -> Vec<String> {
    let mut recommendations = Vec::new();
    let viral = &analysis.viral;

    if analysis.total_posts == 0 {
        recommendations.push("No posts to analyze yet; import recent posts first.".to_string());
        return recommendations;
    }
    if viral.count == 0 {
        recommendations.push(format!(
            "No post reached {} impressions; lower the threshold to surface your top performers.",
            crate::format_number(analysis.default_threshold as f64)
        ));
        return recommendations;
    }

    if let (Some(format), Some(entry)) = (insights.best_format, viral.formats.first()) {
        recommendations.push(format!(
            "Lean into {} posts: {} of {} viral posts used this format.",
            format.label(),
            entry.count,
            viral.count
        ));
    }
    if let (Some(content_type), Some(entry)) =
        (insights.best_content_type, viral.content_types.first())
    {
        recommendations.push(format!(
            "{} content drives reach: {} of {} viral posts.",
            capitalize(content_type.label()),
            entry.count,
            viral.count
        ));
    }
    if let Some(band) = insights.optimal_length {
        recommendations.push(format!(
            "Aim for {}-{} lines; viral posts average {}.",
            format_float(band.min, 1),
            format_float(band.max, 1),
            format_float(band.average, 1)
        ));
    }
    if insights.engagement_lift > 1.0 {
        recommendations.push(format!(
            "Viral posts earn {}x the engagement rate of the rest; reply early to keep velocity up.",
            format_float(insights.engagement_lift, 1)
        ));
    }
    if !insights.sample_hooks.is_empty() {
        recommendations
            .push("Reuse the opening structure of your top hooks for new drafts.".to_string());
    }

    recommendations
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
