use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use likes_to_topics::completion::{AnthropicClient, Completion};
use likes_to_topics::config::{Config, OutputPaths};
use likes_to_topics::logging::{init_logging, LogLevel};
use likes_to_topics::topics::{self, Summary, TopicReport, MAX_PROMPT_POSTS};
use likes_to_topics::{FetchOutcome, LikedPost, OAuthClientProvider, StopReason};

const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
const RULE: usize = 60;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let level = std::env::var(LOG_LEVEL_VAR)
        .ok()
        .and_then(|value| value.parse::<LogLevel>().ok())
        .unwrap_or_default();
    init_logging(level);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    println!("Blog Topic Generation Workflow");
    println!("{}", "=".repeat(50));

    let config = Config::from_env().context("missing or invalid configuration")?;
    println!("\nConfiguration:");
    println!("- Username: @{}", config.username);
    println!("- Max tweets to fetch: {}", config.window.max_results);
    println!("- Days back: {}", config.window.days_back);

    // Step 1: liked posts
    let client = reqwest::Client::new()
        .oauth1(config.credentials.clone())
        .base_url(&config.api_base_url)?
        .bearer_token(config.bearer_token.clone());

    let user_id = client
        .user_id(&config.username)
        .await
        .with_context(|| format!("could not get user id for @{}", config.username))?;
    info!(%user_id, "resolved @{}", config.username);

    let outcome = client.liked_posts(&user_id, config.window).await;
    let posts = liked_posts_or_bail(outcome)?;
    println!("\nFound {} liked tweets", posts.len());
    topics::save_posts(&config.paths.posts, &posts)?;
    println!("\nPreview:");
    for line in topics::preview(&posts, 2) {
        println!("{}", line);
    }

    // Step 2: topics
    let summary = Summary::from_posts(&posts);
    let generated = match config.anthropic_api_key.as_deref() {
        Some(api_key) => {
            let completion = AnthropicClient::new(api_key, config.anthropic_model.as_str());
            generate_topics(&completion, &posts, &config).await
        }
        None => {
            warn!("ANTHROPIC_API_KEY is not set, skipping topic generation");
            None
        }
    };

    let report = TopicReport::new(summary, generated.as_deref());
    topics::save_report(&config.paths.report, &report)?;

    println!("\n{}", "=".repeat(RULE));
    println!("BLOG TOPIC INSPIRATION FROM YOUR LIKED TWEETS");
    println!("{}", "=".repeat(RULE));
    println!("\n{}", report.summary.render());
    let generated_topics = generated.is_some();
    if let Some(text) = generated {
        println!("\n{}", "=".repeat(RULE));
        println!("BLOG TOPIC SUGGESTIONS");
        println!("{}", "=".repeat(RULE));
        println!("{}", text);
    }

    println!("\nWorkflow completed successfully!");
    println!("Files created:");
    for line in created_files(&config.paths, generated_topics) {
        println!("   - {}", line);
    }
    Ok(())
}

fn created_files(paths: &OutputPaths, generated_topics: bool) -> Vec<String> {
    let mut files = vec![format!("{} (liked tweets data)", paths.posts.display())];
    if generated_topics {
        files.push(format!("{} (blog topics)", paths.topics.display()));
    }
    files.push(format!("{} (summary)", paths.report.display()));
    files
}

/// Posts to work with, or the reason there are none. A failed fetch that
/// still collected posts carries on with them.
fn liked_posts_or_bail(outcome: FetchOutcome) -> Result<Vec<LikedPost>> {
    if !outcome.posts.is_empty() {
        return Ok(outcome.posts);
    }
    match outcome.stop {
        StopReason::Failed(err) => Err(err).context("fetching liked tweets failed"),
        _ => bail!("no liked tweets found"),
    }
}

/// Ask the model for topics and write them out. Failures are logged and
/// yield `None`; the rest of the workflow goes on without topics.
async fn generate_topics<C: Completion>(
    completion: &C,
    posts: &[LikedPost],
    config: &Config,
) -> Option<String> {
    let content = topics::prepare_content(posts, MAX_PROMPT_POSTS);
    info!("prepared {} characters of tweet content", content.len());

    let template = match topics::load_prompt_template(&config.paths.prompt_template) {
        Ok(template) => template,
        Err(err) => {
            error!("could not read prompt template: {}", err);
            return None;
        }
    };
    let prompt = topics::build_prompt(template.as_deref(), &content);

    let text = match completion.complete(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            error!("generating topics failed: {}", err);
            return None;
        }
    };
    if let Err(err) = topics::save_topics(&config.paths.topics, &text) {
        error!("could not save topics: {}", err);
    }
    Some(text)
}
