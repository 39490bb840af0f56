//! Turning liked posts into a prompt, and the files the workflow leaves behind.

use std::{
    collections::BTreeSet,
    fs,
    path::Path,
    sync::OnceLock,
};

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::{LikedPost, Result};

/// Posts included in one prompt.
pub const MAX_PROMPT_POSTS: usize = 20;
/// Authors listed in [`Summary::sample_authors`].
pub const MAX_SAMPLE_AUTHORS: usize = 10;

const TEMPLATE_PLACEHOLDER: &str = "{tweet_content}";
const DEFAULT_PROMPT: &str = "Based on these tweets, suggest 3-5 blog post ideas:\n\n";
const TOPICS_HEADER: &str = "BLOG TOPIC SUGGESTIONS";
const RULE_WIDTH: usize = 50;
const PREVIEW_CHARS: usize = 80;

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"https?://\S+").expect("valid url pattern"))
}

fn whitespace_pattern() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Post text with links removed and whitespace collapsed.
pub fn clean_text(text: &str) -> String {
    let without_links = url_pattern().replace_all(text, "");
    whitespace_pattern()
        .replace_all(&without_links, " ")
        .trim()
        .to_string()
}

/// Cleaned text of the first `max_posts` posts, blank-line separated.
/// Posts with nothing left after cleaning are skipped.
pub fn prepare_content(posts: &[LikedPost], max_posts: usize) -> String {
    posts
        .iter()
        .take(max_posts)
        .map(|post| clean_text(&post.text))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fill `template`'s `{tweet_content}` placeholder, or fall back to a short
/// built-in prompt.
pub fn build_prompt(template: Option<&str>, content: &str) -> String {
    match template {
        Some(template) => template.replace(TEMPLATE_PLACEHOLDER, content),
        None => format!("{}{}", DEFAULT_PROMPT, content),
    }
}

/// Read the prompt template; a missing file is not an error.
pub fn load_prompt_template(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(template) => {
            info!(path = %path.display(), "prompt template loaded");
            Ok(Some(template))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "prompt template not found, using default prompt");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_tweets: usize,
    pub unique_authors: usize,
    pub sample_authors: Vec<String>,
}

impl Summary {
    pub fn from_posts(posts: &[LikedPost]) -> Self {
        let authors: BTreeSet<&str> = posts.iter().filter_map(LikedPost::author_username).collect();
        Summary {
            total_tweets: posts.len(),
            unique_authors: authors.len(),
            sample_authors: authors
                .into_iter()
                .take(MAX_SAMPLE_AUTHORS)
                .map(str::to_string)
                .collect(),
        }
    }

    /// Console rendering of the summary.
    pub fn render(&self) -> String {
        let mut lines = vec![
            "Content Summary:".to_string(),
            format!("- Analyzed {} liked tweets", self.total_tweets),
            format!("- From {} different authors", self.unique_authors),
        ];
        if !self.sample_authors.is_empty() {
            let shown = self.sample_authors.iter().take(5).cloned().collect::<Vec<_>>();
            let mut line = format!("- Including content from: {}", shown.join(", "));
            if self.sample_authors.len() > 5 {
                line.push_str(&format!(" and {} others", self.sample_authors.len() - 5));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// What is written to the report file.
#[derive(Debug, Clone, Serialize)]
pub struct TopicReport {
    pub summary: Summary,
    pub blog_topics: Vec<String>,
    pub total_topics: usize,
}

impl TopicReport {
    /// `topics` is the raw completion; each blank-line separated block is one topic.
    pub fn new(summary: Summary, topics: Option<&str>) -> Self {
        let blog_topics: Vec<String> = topics
            .map(|text| {
                text.split("\n\n")
                    .map(str::trim)
                    .filter(|block| !block.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        TopicReport {
            summary,
            total_topics: blog_topics.len(),
            blog_topics,
        }
    }
}

/// `@username: first 80 characters...` for the first `count` posts.
pub fn preview(posts: &[LikedPost], count: usize) -> Vec<String> {
    posts
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, post)| {
            let text: String = post.text.chars().take(PREVIEW_CHARS).collect();
            format!(
                "{}. @{}: {}...",
                i + 1,
                post.author_username().unwrap_or("unknown"),
                text
            )
        })
        .collect()
}

pub fn save_posts(path: &Path, posts: &[LikedPost]) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(posts)?)?;
    info!(path = %path.display(), "saved {} posts", posts.len());
    Ok(())
}

pub fn topics_document(topics: &str) -> String {
    format!("{}\n{}\n\n{}", TOPICS_HEADER, "=".repeat(RULE_WIDTH), topics)
}

pub fn save_topics(path: &Path, topics: &str) -> Result<()> {
    fs::write(path, topics_document(topics))?;
    info!(path = %path.display(), "saved blog topics");
    Ok(())
}

pub fn save_report(path: &Path, report: &TopicReport) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    info!(path = %path.display(), "saved summary");
    Ok(())
}
