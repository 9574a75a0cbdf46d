use chrono::{DateTime, Duration, TimeZone, Utc};
use xboost::rules::{
    evaluate_rule, evaluate_rules, ActionKind, AutomationRule, RuleDraft, RuleKind, RuleStore,
};
use xboost::{Post, XboostError};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn rule(name: &str, kind: RuleKind) -> AutomationRule {
    RuleDraft {
        account_id: "acct".to_string(),
        name: name.to_string(),
        enabled: true,
        kind,
    }
    .into_rule(now())
}

fn post(id: &str, impressions: u64, likes: u64, age_hours: Option<i64>) -> Post {
    let mut post = Post::new(id, "content");
    post.impressions = impressions;
    post.likes = likes;
    post.posted_at = age_hours.map(|hours| now() - Duration::hours(hours));
    post
}

#[test]
fn repost_fires_at_threshold_inclusive() {
    let repost = rule(
        "repost winners",
        RuleKind::AutoRepost {
            min_impressions: 10_000,
            min_likes: None,
        },
    );

    let action = evaluate_rule(&repost, &post("p", 10_000, 0, None), now()).unwrap();
    assert_eq!(action.action, ActionKind::Repost);
    assert_eq!(action.post_id, "p");
    assert!(evaluate_rule(&repost, &post("q", 9_999, 0, None), now()).is_none());
}

#[test]
fn repost_respects_like_floor() {
    let repost = rule(
        "repost liked winners",
        RuleKind::AutoRepost {
            min_impressions: 1_000,
            min_likes: Some(50),
        },
    );
    assert!(evaluate_rule(&repost, &post("p", 5_000, 49, None), now()).is_none());
    assert!(evaluate_rule(&repost, &post("p", 5_000, 50, None), now()).is_some());
}

#[test]
fn plug_replies_with_configured_text() {
    let plug = rule(
        "plug",
        RuleKind::AutoPlug {
            min_impressions: 20_000,
            plug_text: "Grab the free guide".to_string(),
        },
    );
    let action = evaluate_rule(&plug, &post("p", 25_000, 0, None), now()).unwrap();
    assert_eq!(
        action.action,
        ActionKind::Reply {
            text: "Grab the free guide".to_string()
        }
    );
}

#[test]
fn delete_waits_for_age_and_skips_performers() {
    let delete = rule(
        "prune flops",
        RuleKind::AutoDelete {
            max_impressions: 500,
            after_hours: 24,
        },
    );

    assert!(evaluate_rule(&delete, &post("young", 10, 0, Some(23)), now()).is_none());
    assert!(evaluate_rule(&delete, &post("undated", 10, 0, None), now()).is_none());
    assert!(evaluate_rule(&delete, &post("ok", 500, 0, Some(48)), now()).is_none());

    let action = evaluate_rule(&delete, &post("flop", 120, 0, Some(24)), now()).unwrap();
    assert_eq!(action.action, ActionKind::Delete);
    assert!(action.reason.contains("120"));
}

#[test]
fn disabled_rules_never_fire() {
    let mut repost = rule(
        "off",
        RuleKind::AutoRepost {
            min_impressions: 1,
            min_likes: None,
        },
    );
    repost.enabled = false;

    assert!(evaluate_rule(&repost, &post("p", 1_000_000, 0, None), now()).is_none());
    let run = evaluate_rules(&[repost], &[post("p", 1_000_000, 0, None)], now());
    assert_eq!(run.evaluated_rules, 0);
    assert_eq!(run.evaluated_posts, 1);
    assert!(run.actions.is_empty());
}

#[test]
fn run_groups_actions_by_rule() {
    let rules = vec![
        rule(
            "repost",
            RuleKind::AutoRepost {
                min_impressions: 1_000,
                min_likes: None,
            },
        ),
        rule(
            "plug",
            RuleKind::AutoPlug {
                min_impressions: 1_000,
                plug_text: "newsletter".to_string(),
            },
        ),
    ];
    let posts = vec![post("a", 2_000, 0, None), post("b", 10, 0, None), post("c", 5_000, 0, None)];

    let run = evaluate_rules(&rules, &posts, now());
    let order: Vec<(&str, &str)> = run
        .actions
        .iter()
        .map(|action| (action.rule_name.as_str(), action.post_id.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("repost", "a"), ("repost", "c"), ("plug", "a"), ("plug", "c")]
    );
}

#[test]
fn drafts_are_validated() {
    let mut draft = RuleDraft {
        account_id: "acct".to_string(),
        name: "plug".to_string(),
        enabled: true,
        kind: RuleKind::AutoPlug {
            min_impressions: 100,
            plug_text: "   ".to_string(),
        },
    };
    assert!(matches!(draft.validate(), Err(XboostError::InvalidRule(_))));

    draft.kind = RuleKind::AutoDelete {
        max_impressions: 0,
        after_hours: 12,
    };
    assert!(matches!(draft.validate(), Err(XboostError::InvalidRule(_))));

    draft.kind = RuleKind::AutoRepost {
        min_impressions: 100,
        min_likes: None,
    };
    assert!(draft.validate().is_ok());
    draft.name = String::new();
    assert!(draft.validate().is_err());
}

#[test]
fn rule_kind_uses_tagged_json() {
    let draft: RuleDraft = serde_json::from_str(
        r#"{"account_id": "acct", "name": "prune",
            "kind": {"type": "auto_delete", "max_impressions": 300, "after_hours": 6}}"#,
    )
    .unwrap();
    assert!(draft.enabled);
    assert_eq!(draft.kind.label(), "auto_delete");
}

#[tokio::test]
async fn store_persists_crud_across_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data/rules.json");
    let store = RuleStore::load(path.clone()).await.unwrap();

    let created = store
        .create(RuleDraft {
            account_id: "acct-1".to_string(),
            name: "repost".to_string(),
            enabled: true,
            kind: RuleKind::AutoRepost {
                min_impressions: 5_000,
                min_likes: None,
            },
        })
        .await
        .unwrap();
    store
        .create(RuleDraft {
            account_id: "acct-2".to_string(),
            name: "plug".to_string(),
            enabled: true,
            kind: RuleKind::AutoPlug {
                min_impressions: 5_000,
                plug_text: "link".to_string(),
            },
        })
        .await
        .unwrap();

    let updated = store
        .update(
            &created.id,
            RuleDraft {
                account_id: "acct-1".to_string(),
                name: "repost bigger".to_string(),
                enabled: false,
                kind: RuleKind::AutoRepost {
                    min_impressions: 50_000,
                    min_likes: None,
                },
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.created_at, created.created_at);
    assert!(!updated.enabled);

    let reloaded = RuleStore::load(path).await.unwrap();
    assert_eq!(reloaded.list(None).await.len(), 2);
    let acct_one = reloaded.list(Some("acct-1")).await;
    assert_eq!(acct_one.len(), 1);
    assert_eq!(acct_one[0].name, "repost bigger");

    assert!(reloaded.delete(&created.id).await.unwrap());
    assert!(!reloaded.delete(&created.id).await.unwrap());
    assert!(matches!(
        reloaded.get(&created.id).await,
        Err(XboostError::RuleNotFound(_))
    ));
}

#[tokio::test]
async fn store_rejects_invalid_drafts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    let store = RuleStore::load(path.clone()).await.unwrap();

    let err = store
        .create(RuleDraft {
            account_id: "acct".to_string(),
            name: "".to_string(),
            enabled: true,
            kind: RuleKind::AutoRepost {
                min_impressions: 1,
                min_likes: None,
            },
        })
        .await
        .unwrap_err();
    assert!(matches!(err, XboostError::InvalidRule(_)));
    assert!(!path.exists());
}

#[tokio::test]
async fn failed_writes_leave_the_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    let store = RuleStore::load(path.clone()).await.unwrap();
    let kept = store
        .create(RuleDraft {
            account_id: "acct".to_string(),
            name: "repost".to_string(),
            enabled: true,
            kind: RuleKind::AutoRepost {
                min_impressions: 1_000,
                min_likes: None,
            },
        })
        .await
        .unwrap();

    // A directory where the temp file should go makes every write fail.
    std::fs::create_dir(dir.path().join("rules.json.tmp")).unwrap();

    let created = store
        .create(RuleDraft {
            account_id: "acct".to_string(),
            name: "plug".to_string(),
            enabled: true,
            kind: RuleKind::AutoPlug {
                min_impressions: 1_000,
                plug_text: "link".to_string(),
            },
        })
        .await;
    assert!(matches!(created, Err(XboostError::Io(_))));

    let updated = store
        .update(
            &kept.id,
            RuleDraft {
                account_id: "acct".to_string(),
                name: "renamed".to_string(),
                enabled: false,
                kind: RuleKind::AutoRepost {
                    min_impressions: 9_000,
                    min_likes: None,
                },
            },
        )
        .await;
    assert!(updated.is_err());
    assert!(store.delete(&kept.id).await.is_err());

    let rules = store.list(None).await;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "repost");
    assert!(rules[0].enabled);
}
