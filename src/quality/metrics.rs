//! Raw text metrics feeding the quality score

use regex::Regex;
use std::sync::LazyLock;

static FENCED_CODE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").ok());
static INLINE_CODE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"`[^`]+`").ok());
static HEADER_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+.+").ok());
static MARKDOWN_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").ok());
static FENCED_BLOCK_BODY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w*)\n(.*?)```").ok());

/// Phrases counted as boilerplate when estimating the content ratio
const BOILERPLATE_PHRASES: &[&str] = &[
    "copyright",
    "all rights reserved",
    "privacy policy",
    "terms of service",
    "cookie policy",
    "newsletter",
    "subscribe",
    "follow us",
    "social media",
    "navigation",
    "menu",
    "footer",
    "header",
];

/// Inline code spans that count as one code block
const INLINE_SPANS_PER_BLOCK: usize = 3;

/// Measurements taken from a page's title and extracted text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentMetrics {
    pub word_count: usize,
    pub code_block_count: usize,
    pub header_count: usize,
    pub total_lines: usize,
    pub empty_lines: usize,
    pub empty_line_ratio: f64,
    pub content_ratio: f64,
    pub has_title: bool,
    pub has_headers: bool,
}

/// A fenced code block with its info-string language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub content: String,
    pub line_count: usize,
}

pub fn extract_metrics(title: &str, content: &str) -> ContentMetrics {
    let total_lines = content.split('\n').count();
    let empty_lines = content
        .split('\n')
        .filter(|line| line.trim().is_empty())
        .count();
    let header_count = count_headers(content);

    ContentMetrics {
        word_count: count_words(content),
        code_block_count: count_code_blocks(content),
        header_count,
        total_lines,
        empty_lines,
        empty_line_ratio: empty_lines as f64 / total_lines as f64,
        content_ratio: content_ratio(content),
        has_title: has_title(title),
        has_headers: header_count > 0,
    }
}

/// "Untitled" is the extractor's placeholder and does not count as a title
pub fn has_title(title: &str) -> bool {
    let title = title.trim();
    !title.is_empty() && title != "Untitled"
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Fenced blocks plus one block per three inline spans outside them
pub fn count_code_blocks(text: &str) -> usize {
    let (fenced, remainder) = match FENCED_CODE.as_ref() {
        Some(re) => (re.find_iter(text).count(), re.replace_all(text, "")),
        None => (0, text.into()),
    };
    let inline = count_matches(&INLINE_CODE, &remainder);

    fenced + inline / INLINE_SPANS_PER_BLOCK
}

pub fn count_headers(text: &str) -> usize {
    count_matches(&HEADER_LINE, text)
}

pub fn count_markdown_links(text: &str) -> usize {
    count_matches(&MARKDOWN_LINK, text)
}

fn count_matches(pattern: &LazyLock<Option<Regex>>, text: &str) -> usize {
    pattern
        .as_ref()
        .map_or(0, |re| re.find_iter(text).count())
}

/// Share of the text that is not boilerplate, in [0, 1]
///
/// Empty text has a ratio of 0.
pub fn content_ratio(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let lowered = text.to_lowercase();
    let boilerplate: usize = BOILERPLATE_PHRASES
        .iter()
        .map(|phrase| lowered.matches(phrase).count() * phrase.len())
        .sum();

    let total = lowered.len();
    total.saturating_sub(boilerplate) as f64 / total as f64
}

pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    let Some(re) = FENCED_BLOCK_BODY.as_ref() else {
        return Vec::new();
    };

    re.captures_iter(text)
        .map(|caps| {
            let language = match &caps[1] {
                "" => "text".to_string(),
                lang => lang.to_string(),
            };
            let content = caps[2].to_string();
            let line_count = content.lines().count();
            CodeBlock {
                language,
                content,
                line_count,
            }
        })
        .collect()
}
