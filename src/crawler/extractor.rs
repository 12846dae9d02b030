//! HTML extraction of titles, readable content and links
//!
//! Content extraction drops chrome (scripts, navigation, footers, sidebars and
//! similar) and prefers a recognizable content area over the whole body.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Content-area selectors in order of preference
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    ".main",
    "#main",
    ".content",
    "#content",
    ".main-content",
    "article",
    ".article",
    ".documentation",
    ".docs",
    ".doc-content",
    ".post-content",
    ".entry-content",
    ".page-content",
    ".body-content",
    ".markdown-body",
    ".wiki-content",
];

/// Subtrees excluded from extracted content
const REMOVE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "nav",
    "footer",
    "header",
    ".navigation",
    ".sidebar",
    ".menu",
    ".breadcrumb",
    ".toc",
    ".table-of-contents",
    ".related",
    ".tags",
    ".metadata",
    ".comments",
    ".social-share",
    ".advertisement",
    ".ads",
];

/// Element selectors tried for the title before the `data-title` attribute
const TITLE_SELECTORS: &[&str] = &["title", "h1", ".page-title", ".main-title", ".doc-title"];

/// Placeholder title for pages without one
pub const UNTITLED: &str = "Untitled";

/// A content area must have more than this many characters to be preferred over the body
const MIN_CONTENT_AREA_CHARS: usize = 100;

static CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_selectors(CONTENT_SELECTORS));
static REMOVE: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_selectors(REMOVE_SELECTORS));
static TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_selectors(TITLE_SELECTORS));
static DATA_TITLE: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("[data-title]").ok());
static BODY: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("body").ok());
static ANCHOR: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("a[href]").ok());

static NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i).*?Skip to .*?content\s*",
        r"(?i)Click here to \w+\s*",
        r"(?i)Subscribe to \w+ \w+\s*",
        r"(?i)Follow us on \w+\s*",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});
static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

fn parse_selectors(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

/// Title, cleaned content and raw link targets of one HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub content: String,
    /// `href` values exactly as written; resolution happens during admission
    pub links: Vec<String>,
}

/// Parses `html` and extracts everything the crawl needs from it
///
/// # Example
///
/// ```
/// use docmapper::crawler::extract_page;
///
/// let html = r#"<html><head><title>Intro</title></head>
///   <body><nav><a href="/docs/">Docs</a></nav><p>Hello</p></body></html>"#;
/// let page = extract_page(html);
/// assert_eq!(page.title, "Intro");
/// assert_eq!(page.content, "Hello");
/// assert_eq!(page.links, vec!["/docs/"]);
/// ```
pub fn extract_page(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    ExtractedPage {
        title: extract_title(&document),
        content: extract_content(&document),
        links: extract_links(&document),
    }
}

/// First non-empty of `<title>`, `<h1>`, title-class elements, then `data-title`
pub fn extract_title(document: &Html) -> String {
    for selector in TITLE.iter() {
        if let Some(element) = document.select(selector).next() {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    if let Some(selector) = DATA_TITLE.as_ref() {
        if let Some(title) = document
            .select(selector)
            .next()
            .and_then(|element| element.value().attr("data-title"))
            .map(str::trim)
            .filter(|title| !title.is_empty())
        {
            return title.to_string();
        }
    }

    UNTITLED.to_string()
}

/// Readable text of the page's content area, or of the body as a fallback
pub fn extract_content(document: &Html) -> String {
    for selector in CONTENT.iter() {
        let Some(element) = document.select(selector).find(|el| !is_within_removed(el)) else {
            continue;
        };

        let text = visible_text(element);
        if text.trim().chars().count() > MIN_CONTENT_AREA_CHARS {
            return clean_text(&text);
        }
    }

    let body = BODY
        .as_ref()
        .and_then(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element());

    clean_text(&visible_text(body))
}

/// `href` of every `<a>` without a `download` attribute
pub fn extract_links(document: &Html) -> Vec<String> {
    let Some(selector) = ANCHOR.as_ref() else {
        return Vec::new();
    };

    document
        .select(selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

fn is_removed(element: &ElementRef<'_>) -> bool {
    REMOVE.iter().any(|selector| selector.matches(element))
}

fn is_within_removed(element: &ElementRef<'_>) -> bool {
    is_removed(element)
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| is_removed(&ancestor))
}

/// Text nodes under `element`, one per line, skipping removed subtrees
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push('\n');
        } else if let Some(child) = ElementRef::wrap(child) {
            if !is_removed(&child) {
                collect_text(child, out);
            }
        }
    }
}

/// Strips noise phrases, then collapses whitespace runs into single spaces
pub fn clean_text(text: &str) -> String {
    let mut cleaned = text.to_string();
    for pattern in NOISE.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    match WHITESPACE.as_ref() {
        Some(whitespace) => whitespace.replace_all(&cleaned, " ").trim().to_string(),
        None => cleaned.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(word: &str) -> String {
        vec![word; 40].join(" ")
    }

    #[test]
    fn test_title_from_title_tag() {
        let page = extract_page("<html><head><title>  Guide  </title></head><body><h1>H</h1></body></html>");
        assert_eq!(page.title, "Guide");
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let page = extract_page("<html><head><title> </title></head><body><h1>Heading</h1></body></html>");
        assert_eq!(page.title, "Heading");
    }

    #[test]
    fn test_title_from_class_and_data_attribute() {
        let page = extract_page(r#"<body><div class="doc-title">Doc Title</div></body>"#);
        assert_eq!(page.title, "Doc Title");

        let page = extract_page(r#"<body><div data-title="From Attr">x</div></body>"#);
        assert_eq!(page.title, "From Attr");
    }

    #[test]
    fn test_title_defaults_to_untitled() {
        let page = extract_page("<html><body><p>No title here</p></body></html>");
        assert_eq!(page.title, UNTITLED);
    }

    #[test]
    fn test_content_prefers_main_area() {
        let html = format!(
            "<html><body><div>outside text</div><main><p>{}</p></main></body></html>",
            long_text("inside")
        );
        let page = extract_page(&html);
        assert!(page.content.starts_with("inside inside"));
        assert!(!page.content.contains("outside"));
    }

    #[test]
    fn test_short_content_area_falls_back_to_body() {
        let html = "<html><body><main>tiny</main><p>body text</p></body></html>";
        let page = extract_page(html);
        assert_eq!(page.content, "tiny body text");
    }

    #[test]
    fn test_removes_chrome() {
        let html = r#"<html><body>
            <header>Site Header</header>
            <nav>Nav Links</nav>
            <div class="sidebar">Sidebar</div>
            <script>var x = 1;</script>
            <style>p { color: red; }</style>
            <p>Real content</p>
            <footer>Footer text</footer>
        </body></html>"#;
        let page = extract_page(html);
        assert_eq!(page.content, "Real content");
    }

    #[test]
    fn test_content_area_inside_removed_subtree_ignored() {
        let html = format!(
            r#"<html><body><nav><div class="content">{}</div></nav><p>kept</p></body></html>"#,
            long_text("menu")
        );
        let page = extract_page(&html);
        assert_eq!(page.content, "kept");
    }

    #[test]
    fn test_noise_phrases_stripped() {
        assert_eq!(
            clean_text("Skip to main content\nWelcome to the guide"),
            "Welcome to the guide"
        );
        assert_eq!(
            clean_text("Read this. Click here to download the file"),
            "Read this. the file"
        );
        assert_eq!(clean_text("Subscribe to our newsletter today"), "today");
        assert_eq!(clean_text("Follow us on Mastodon for news"), "for news");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(clean_text("  a \n\n b\t\tc  "), "a b c");
    }

    #[test]
    fn test_extract_links() {
        let html = r##"<html><body>
            <nav><a href="/docs/">Docs</a></nav>
            <a href=" guide.html ">Guide</a>
            <a href="#top">Top</a>
            <a href="/file.zip" download>Download</a>
            <a href="">Empty</a>
            <a>No href</a>
        </body></html>"##;
        let page = extract_page(html);
        assert_eq!(page.links, vec!["/docs/", "guide.html", "#top"]);
    }
}
