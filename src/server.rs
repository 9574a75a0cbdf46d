use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use xboost::{
    analyze_posts,
    config::XboostConfig,
    rate_limit::SlidingWindowLimiter,
    rules::{evaluate_rules, AutomationRule, AutomationRun, RuleDraft, RuleStore},
    Result, XboostError,
};

use crate::api::{
    analysis_config, into_posts, parse_username, AccountQuery, AnalyzeRequest, AnalyzeResponse,
    DraftRequest, EvaluateRequest, RulesQuery,
};
use crate::llm::{LlmClient, PostDraft};
use crate::x_api::XApiClient;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    config: Arc<XboostConfig>,
    limiter: Arc<SlidingWindowLimiter>,
    rules: Arc<RuleStore>,
    x_api: Option<XApiClient>,
    llm_client: Option<LlmClient>,
}

pub async fn serve(args: crate::ServeArgs) -> Result<()> {
    let (mut config, config_path) = XboostConfig::load(args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.web_root.is_some() {
        config.server.web_root = args.web_root;
    }

    let rules = RuleStore::load(config.server.rules_path.clone()).await?;
    let limiter = Arc::new(SlidingWindowLimiter::new(config.rate_limit.clone()));
    limiter.clone().spawn_cleanup();

    let state = AppState {
        config: Arc::new(config.clone()),
        limiter,
        rules: Arc::new(rules),
        x_api: XApiClient::from_env(),
        llm_client: LlmClient::from_env(None),
    };
    if state.x_api.is_none() {
        tracing::warn!("X API credentials not set; account analysis is disabled");
    }
    if state.llm_client.is_none() {
        tracing::warn!("AI_API_KEY not set; drafting is disabled");
    }

    let mut app = router(state);
    if let Some(web_root) = config.server.web_root.as_deref() {
        let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
        app = app.fallback_service(
            ServeDir::new(web_root).not_found_service(ServeFile::new(index_path)),
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| XboostError::Config(format!("invalid bind address: {}", err)))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        config = ?config_path,
        viral_threshold = config.analysis.viral_threshold,
        rate_limit = config.rate_limit.max_requests,
        "xboost server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/accounts/:username/analysis", get(account_analysis_handler))
        .route("/rules", get(list_rules_handler).post(create_rule_handler))
        .route(
            "/rules/:id",
            get(get_rule_handler)
                .put(update_rule_handler)
                .delete(delete_rule_handler),
        )
        .route("/automations/evaluate", post(evaluate_handler))
        .route("/drafts", post(draft_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .route("/health", get(health));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(XboostError::Unauthorized)?;

    let decision = state.limiter.check(&api_key).await;
    if !decision.allowed {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        return Err(XboostError::RateLimited {
            retry_after_secs: decision.retry_after.as_secs().max(1),
        });
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
    Ok(response)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    let (posts, config, warnings) = request.into_parts(&state.config.analysis)?;
    let report = analyze_posts(&posts, &config);
    tracing::debug!(
        posts = posts.len(),
        viral = report.analysis.viral.count,
        "analyzed posts"
    );
    Ok(Json(AnalyzeResponse::from_report(report, warnings)))
}

async fn account_analysis_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<AnalyzeResponse>> {
    let username = parse_username(&username)?;
    let client = state.x_api.as_ref().ok_or(XboostError::NotConfigured("X API"))?;
    let config = analysis_config(&state.config.analysis, query.viral_threshold, None)?;
    let posts = client
        .fetch_recent_posts(username, query.limit.unwrap_or(100))
        .await?;
    let report = analyze_posts(&posts, &config);
    Ok(Json(AnalyzeResponse::from_report(report, Vec::new())))
}

async fn list_rules_handler(
    State(state): State<AppState>,
    Query(query): Query<RulesQuery>,
) -> Json<Vec<AutomationRule>> {
    Json(state.rules.list(query.account_id.as_deref()).await)
}

async fn get_rule_handler(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<Json<AutomationRule>> {
    Ok(Json(state.rules.get(&rule_id).await?))
}

async fn create_rule_handler(
    State(state): State<AppState>,
    Json(draft): Json<RuleDraft>,
) -> Result<(StatusCode, Json<AutomationRule>)> {
    let rule = state.rules.create(draft).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn update_rule_handler(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
    Json(draft): Json<RuleDraft>,
) -> Result<Json<AutomationRule>> {
    Ok(Json(state.rules.update(&rule_id, draft).await?))
}

async fn delete_rule_handler(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<StatusCode> {
    if state.rules.delete(&rule_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(XboostError::RuleNotFound(rule_id))
    }
}

async fn evaluate_handler(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<AutomationRun>> {
    let (posts, _) = into_posts(request.posts)?;
    let rules = state.rules.list(Some(request.account_id.as_str())).await;
    let now = request.now.unwrap_or_else(Utc::now);
    let run = evaluate_rules(&rules, &posts, now);
    tracing::info!(
        account_id = %request.account_id,
        rules = run.evaluated_rules,
        posts = run.evaluated_posts,
        actions = run.actions.len(),
        "evaluated automations"
    );
    Ok(Json(run))
}

async fn draft_handler(
    State(state): State<AppState>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<PostDraft>> {
    let client = state
        .llm_client
        .as_ref()
        .ok_or(XboostError::NotConfigured("AI client"))?;
    if request.topic.trim().is_empty() {
        return Err(XboostError::InvalidRequest("topic is required".to_string()));
    }
    let config = analysis_config(&state.config.analysis, request.viral_threshold, None)?;
    let (posts, _) = into_posts(request.posts)?;
    let report = analyze_posts(&posts, &config);
    Ok(Json(client.draft_post(&request.topic, &report.insights).await?))
}
