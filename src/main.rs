mod api;
mod llm;
mod server;
mod x_api;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use xboost::{
    analyze_posts, config::XboostConfig, format_float, format_number, format_percent,
    rules::{evaluate_rules, ActionKind, RuleStore},
    GroupStats, Result, WinningPatternReport, XboostError,
};

use crate::api::{analysis_config, into_posts, parse_username, ApiPost};

#[derive(Parser)]
#[command(name = "xboost", about = "Winning-pattern analytics and automation rules for X accounts")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze posts read from a JSON file or stdin
    Analyze(AnalyzeArgs),
    /// Fetch an account's recent posts from the X API and analyze them
    Fetch(FetchArgs),
    /// Run automation rules from a rules file against posts
    Evaluate(EvaluateArgs),
    /// Draft a post with the AI client, steered by the winning patterns
    Draft(DraftArgs),
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct AnalyzeArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    threshold: Option<u64>,
    #[arg(long)]
    hooks: Option<usize>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct FetchArgs {
    #[arg(long)]
    username: String,
    #[arg(long, default_value_t = 100)]
    limit: usize,
    #[arg(long)]
    threshold: Option<u64>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct EvaluateArgs {
    #[arg(long)]
    rules: PathBuf,
    #[arg(long)]
    posts: Option<PathBuf>,
    #[arg(long)]
    account: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct DraftArgs {
    #[arg(long)]
    topic: String,
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    threshold: Option<u64>,
    #[arg(long)]
    model: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    web_root: Option<String>,
    #[arg(skip)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => run_analyze(args, cli.config),
        Command::Fetch(args) => run_fetch(args, cli.config).await,
        Command::Evaluate(args) => run_evaluate(args).await,
        Command::Draft(args) => run_draft(args, cli.config).await,
        Command::Serve(mut args) => {
            args.config = cli.config;
            server::serve(args).await
        }
    }
}

fn run_analyze(args: AnalyzeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (config, _) = XboostConfig::load(config_path)?;
    let analysis = analysis_config(&config.analysis, args.threshold, args.hooks)?;
    let (posts, warnings) = into_posts(read_posts(args.input.as_deref())?)?;
    let report = analyze_posts(&posts, &analysis);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

async fn run_fetch(args: FetchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (config, _) = XboostConfig::load(config_path)?;
    let analysis = analysis_config(&config.analysis, args.threshold, None)?;
    let client = x_api::XApiClient::from_env().ok_or(XboostError::NotConfigured(
        "X API (set X_API_BEARER_TOKEN or X_OAUTH_CLIENT_ID/X_OAUTH_CLIENT_SECRET)",
    ))?;
    let posts = client
        .fetch_recent_posts(parse_username(&args.username)?, args.limit)
        .await?;
    let report = analyze_posts(&posts, &analysis);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let store = RuleStore::load(args.rules).await?;
    let rules = store.list(args.account.as_deref()).await;
    let (posts, _) = into_posts(read_posts(args.posts.as_deref())?)?;
    let run = evaluate_rules(&rules, &posts, Utc::now());

    println!(
        "Evaluated {} rule(s) against {} post(s): {} action(s)",
        run.evaluated_rules,
        run.evaluated_posts,
        run.actions.len()
    );
    for action in run.actions {
        let verb = match &action.action {
            ActionKind::Repost => "repost".to_string(),
            ActionKind::Delete => "delete".to_string(),
            ActionKind::Reply { text } => format!("reply \"{}\"", text),
        };
        println!(
            "- [{}] {} post {}: {}",
            action.rule_name, verb, action.post_id, action.reason
        );
    }
    Ok(())
}

async fn run_draft(args: DraftArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (config, _) = XboostConfig::load(config_path)?;
    let analysis = analysis_config(&config.analysis, args.threshold, None)?;
    let client = llm::LlmClient::from_env(args.model)
        .ok_or(XboostError::NotConfigured("AI client (set AI_API_KEY)"))?;
    let posts = match args.input.as_deref() {
        Some(path) => into_posts(read_posts(Some(path))?)?.0,
        None => Vec::new(),
    };
    let report = analyze_posts(&posts, &analysis);
    let draft = client.draft_post(&args.topic, &report.insights).await?;

    println!("{}", draft.content);
    println!(
        "\n[{} / {}] {}",
        draft.format.label(),
        draft.content_type.label(),
        draft.rationale
    );
    Ok(())
}

fn print_report(report: &WinningPatternReport) {
    let analysis = &report.analysis;
    let insights = &report.insights;

    println!(
        "Posts analyzed: {} (viral threshold {} impressions)",
        format_number(analysis.total_posts as f64),
        format_number(analysis.default_threshold as f64)
    );
    println!(
        "Viral: {} ({})",
        analysis.viral.count,
        format_percent(insights.viral_rate)
    );
    print_group("Viral", &analysis.viral);
    print_group("Normal", &analysis.normal);

    if let Some(format) = insights.best_format {
        println!("Best format: {}", format.label());
    }
    if let Some(content_type) = insights.best_content_type {
        println!("Best content type: {}", content_type.label());
    }
    if let Some(band) = insights.optimal_length {
        println!(
            "Optimal length: {}-{} lines (viral average {})",
            format_float(band.min, 1),
            format_float(band.max, 1),
            format_float(band.average, 1)
        );
    }

    if !insights.sample_hooks.is_empty() {
        println!("\nTop hooks:");
        for hook in &insights.sample_hooks {
            println!("- {}", hook.replace('\n', " / "));
        }
    }
    if !insights.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &insights.recommendations {
            println!("- {}", recommendation);
        }
    }
}

fn print_group(label: &str, stats: &GroupStats) {
    println!(
        "  {}: {} posts | avg impressions {} | engagement {} | {} lines | {} chars",
        label,
        stats.count,
        format_number(stats.avg_impressions),
        format_percent(stats.avg_engagement_rate),
        format_float(stats.avg_content_length, 1),
        format_float(stats.avg_char_count, 0)
    );
}

/// Accepts either a bare JSON array of posts or an object with a `posts` field.
fn read_posts(path: Option<&Path>) -> Result<Vec<ApiPost>> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    if raw.trim().is_empty() {
        return Err(XboostError::InvalidRequest(
            "missing posts: pass --input or pipe JSON on stdin".to_string(),
        ));
    }

    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let posts = match value {
        serde_json::Value::Object(mut object) => object
            .remove("posts")
            .ok_or_else(|| XboostError::InvalidRequest("expected a `posts` field".to_string()))?,
        other => other,
    };
    Ok(serde_json::from_value(posts)?)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xboost=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
