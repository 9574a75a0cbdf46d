use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format_number;
use crate::rules::model::{AutomationRule, RuleKind};
use crate::Post;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Repost,
    Reply { text: String },
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggeredAction {
    pub rule_id: String,
    pub rule_name: String,
    pub post_id: String,
    pub action: ActionKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationRun {
    pub evaluated_rules: usize,
    pub evaluated_posts: usize,
    pub actions: Vec<TriggeredAction>,
}

pub fn evaluate_rule(
    rule: &AutomationRule,
    post: &Post,
    now: DateTime<Utc>,
) -> Option<TriggeredAction> {
    if !rule.enabled {
        return None;
    }

    let (action, reason) = match &rule.kind {
        RuleKind::AutoRepost {
            min_impressions,
            min_likes,
        } => {
            if post.impressions < *min_impressions {
                return None;
            }
            if let Some(min_likes) = min_likes {
                if post.likes < *min_likes {
                    return None;
                }
            }
            (
                ActionKind::Repost,
                format!(
                    "{} impressions reached the {} repost threshold",
                    format_number(post.impressions as f64),
                    format_number(*min_impressions as f64)
                ),
            )
        }
        RuleKind::AutoPlug {
            min_impressions,
            plug_text,
        } => {
            if post.impressions < *min_impressions {
                return None;
            }
            (
                ActionKind::Reply {
                    text: plug_text.clone(),
                },
                format!(
                    "{} impressions reached the {} plug threshold",
                    format_number(post.impressions as f64),
                    format_number(*min_impressions as f64)
                ),
            )
        }
        RuleKind::AutoDelete {
            max_impressions,
            after_hours,
        } => {
            let age = post.age_hours(now)?;
            if age < *after_hours as f64 || post.impressions >= *max_impressions {
                return None;
            }
            (
                ActionKind::Delete,
                format!(
                    "only {} impressions after {:.0}h (needs {})",
                    format_number(post.impressions as f64),
                    age,
                    format_number(*max_impressions as f64)
                ),
            )
        }
    };

    Some(TriggeredAction {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        post_id: post.id.clone(),
        action,
        reason,
    })
}

/// Runs every enabled rule against every post. Actions come out grouped by
/// rule, in the order the rules were given.
pub fn evaluate_rules(
    rules: &[AutomationRule],
    posts: &[Post],
    now: DateTime<Utc>,
) -> AutomationRun {
    let enabled: Vec<&AutomationRule> = rules.iter().filter(|rule| rule.enabled).collect();
    let actions = enabled
        .iter()
        .copied()
        .flat_map(|rule| {
            posts
                .iter()
                .filter_map(move |post| evaluate_rule(rule, post, now))
        })
        .collect();

    AutomationRun {
        evaluated_rules: enabled.len(),
        evaluated_posts: posts.len(),
        actions,
    }
}
