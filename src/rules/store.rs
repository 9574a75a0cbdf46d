use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Result, XboostError};
use crate::rules::model::{AutomationRule, RuleDraft};

/// JSON-file backed rule records. The whole file is rewritten on every
/// mutation through a temp file and rename; memory only changes once the
/// write has succeeded.
pub struct RuleStore {
    path: PathBuf,
    rules: Mutex<Vec<AutomationRule>>,
}

impl RuleStore {
    pub async fn load(path: PathBuf) -> Result<Self> {
        let rules = if path.exists() {
            let data = tokio::fs::read_to_string(&path).await?;
            if data.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            Vec::new()
        };

        tracing::info!(path = %path.display(), count = rules.len(), "loaded automation rules");
        Ok(Self {
            path,
            rules: Mutex::new(rules),
        })
    }

    pub async fn list(&self, account_id: Option<&str>) -> Vec<AutomationRule> {
        let guard = self.rules.lock().await;
        guard
            .iter()
            .filter(|rule| account_id.map_or(true, |account| rule.account_id == account))
            .cloned()
            .collect()
    }

    pub async fn get(&self, rule_id: &str) -> Result<AutomationRule> {
        let guard = self.rules.lock().await;
        guard
            .iter()
            .find(|rule| rule.id == rule_id)
            .cloned()
            .ok_or_else(|| XboostError::RuleNotFound(rule_id.to_string()))
    }

    pub async fn create(&self, draft: RuleDraft) -> Result<AutomationRule> {
        draft.validate()?;
        let rule = draft.into_rule(Utc::now());
        let mut guard = self.rules.lock().await;
        let mut next = guard.clone();
        next.push(rule.clone());
        self.persist(&next).await?;
        *guard = next;
        tracing::info!(rule_id = %rule.id, kind = rule.kind.label(), "created rule");
        Ok(rule)
    }

    pub async fn update(&self, rule_id: &str, draft: RuleDraft) -> Result<AutomationRule> {
        draft.validate()?;
        let mut guard = self.rules.lock().await;
        let mut next = guard.clone();
        let rule = next
            .iter_mut()
            .find(|rule| rule.id == rule_id)
            .ok_or_else(|| XboostError::RuleNotFound(rule_id.to_string()))?;
        draft.apply_to(rule, Utc::now());
        let updated = rule.clone();
        self.persist(&next).await?;
        *guard = next;
        Ok(updated)
    }

    pub async fn delete(&self, rule_id: &str) -> Result<bool> {
        let mut guard = self.rules.lock().await;
        let next: Vec<AutomationRule> = guard
            .iter()
            .filter(|rule| rule.id != rule_id)
            .cloned()
            .collect();
        if next.len() == guard.len() {
            return Ok(false);
        }
        self.persist(&next).await?;
        *guard = next;
        tracing::info!(rule_id, "deleted rule");
        Ok(true)
    }

    async fn persist(&self, rules: &[AutomationRule]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        let payload = serde_json::to_string_pretty(rules)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

async fn ensure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}
