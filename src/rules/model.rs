use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, XboostError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    AutoRepost {
        min_impressions: u64,
        #[serde(default)]
        min_likes: Option<u64>,
    },
    AutoPlug {
        min_impressions: u64,
        plug_text: String,
    },
    AutoDelete {
        max_impressions: u64,
        after_hours: u64,
    },
}

impl RuleKind {
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::AutoRepost { .. } => "auto_repost",
            RuleKind::AutoPlug { .. } => "auto_plug",
            RuleKind::AutoDelete { .. } => "auto_delete",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            RuleKind::AutoRepost {
                min_impressions, ..
            } if *min_impressions == 0 => Err(XboostError::InvalidRule(
                "auto_repost needs min_impressions above zero".to_string(),
            )),
            RuleKind::AutoPlug {
                min_impressions, ..
            } if *min_impressions == 0 => Err(XboostError::InvalidRule(
                "auto_plug needs min_impressions above zero".to_string(),
            )),
            RuleKind::AutoPlug { plug_text, .. } if plug_text.trim().is_empty() => Err(
                XboostError::InvalidRule("auto_plug needs a plug_text".to_string()),
            ),
            RuleKind::AutoDelete {
                max_impressions, ..
            } if *max_impressions == 0 => Err(XboostError::InvalidRule(
                "auto_delete needs max_impressions above zero".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub enabled: bool,
    pub kind: RuleKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied fields of a rule, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDraft {
    pub account_id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub kind: RuleKind,
}

fn default_enabled() -> bool {
    true
}

impl RuleDraft {
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(XboostError::InvalidRule("account_id is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(XboostError::InvalidRule("name is required".to_string()));
        }
        self.kind.validate()
    }

    pub fn into_rule(self, now: DateTime<Utc>) -> AutomationRule {
        AutomationRule {
            id: Uuid::new_v4().to_string(),
            account_id: self.account_id.trim().to_string(),
            name: self.name.trim().to_string(),
            enabled: self.enabled,
            kind: self.kind,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_to(self, rule: &mut AutomationRule, now: DateTime<Utc>) {
        rule.account_id = self.account_id.trim().to_string();
        rule.name = self.name.trim().to_string();
        rule.enabled = self.enabled;
        rule.kind = self.kind;
        rule.updated_at = now;
    }
}
