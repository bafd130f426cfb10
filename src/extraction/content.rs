//! Article content extraction
//!
//! Turns a rendered HTML document and its [`DomainConfig`] into minimal
//! article markup: locate the container, drop configured noise subtrees,
//! collect the own text of every allowed tag, filter, deduplicate and
//! serialize.

use crate::config::{DomainConfig, Locator};
use crate::error::ExtractionError;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, instrument};

/// Elements whose text never counts as article text
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Small wrappers dropped when their own text carries a noise keyword
const PRUNABLE_WRAPPERS: [&str; 5] = ["div", "span", "aside", "footer", "nav"];

/// Wrappers with at least this much text are never pruned
const PRUNE_TEXT_LIMIT: usize = 200;

/// Class names marking "related stories" widgets
fn related_class() -> Option<&'static Regex> {
    static RELATED: OnceLock<Option<Regex>> = OnceLock::new();
    RELATED
        .get_or_init(|| Regex::new(r"(?i)related|also").ok())
        .as_ref()
}

/// One surviving text block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Original tag name
    pub tag: String,
    /// Trimmed, whitespace-collapsed text
    pub text: String,
}

impl TextBlock {
    /// Serialize as `<tag>text</tag>`
    pub fn to_html(&self) -> String {
        format!(
            "<{tag}>{}</{tag}>",
            htmlescape::encode_minimal(&self.text),
            tag = self.tag
        )
    }
}

/// Extracted content from a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Minimal article markup
    pub html: String,
    /// Surviving blocks in document order
    pub blocks: Vec<TextBlock>,
    /// Plain text, one block per paragraph
    pub text: String,
    /// Word count
    pub word_count: usize,
    /// Character count of `text`
    pub char_count: usize,
    /// Number of article roots walked
    pub roots: usize,
}

/// Content extraction functionality
pub struct ContentExtractor;

impl ContentExtractor {
    /// Extract article markup from `html` using `config`
    #[instrument(skip(html, config), fields(domain = %config.domain_name))]
    pub fn extract(html: &str, config: &DomainConfig) -> Result<ExtractedContent, ExtractionError> {
        let mut document = Html::parse_document(html);

        let roots: Vec<_> = Self::locate_roots(&document, config)?
            .iter()
            .map(|el| el.id())
            .collect();
        let removed = Self::strip_elements(&mut document, &config.elements_to_remove)?;
        let pruned = Self::prune_noise_wrappers(&mut document, &config.noise_keywords);

        let mut candidates = Vec::new();
        let mut walked = 0;
        for id in &roots {
            let Some(root) = document.tree.get(*id).and_then(ElementRef::wrap) else {
                continue;
            };
            if !Self::is_attached(&document, root) {
                continue;
            }
            walked += 1;
            Self::collect_candidates(root, config, &mut candidates);
        }

        let blocks = Self::filter_blocks(candidates, config);
        debug!(
            "Walked {} root(s), removed {} subtree(s), pruned {} wrapper(s), kept {} block(s)",
            walked,
            removed,
            pruned,
            blocks.len()
        );

        if blocks.is_empty() {
            return Err(ExtractionError::EmptyResult);
        }

        let html = blocks.iter().map(TextBlock::to_html).collect::<String>();
        let text = blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();

        Ok(ExtractedContent {
            html,
            blocks,
            text,
            word_count,
            char_count,
            roots: walked,
        })
    }

    /// Try each container locator in turn; the first match wins
    fn locate_roots<'a>(
        document: &'a Html,
        config: &DomainConfig,
    ) -> Result<Vec<ElementRef<'a>>, ExtractionError> {
        for (index, locator) in config.container_locators().iter().enumerate() {
            let Some(root) = Self::find_first(document, locator)? else {
                debug!("Container locator {} matched nothing", locator);
                continue;
            };

            // A primary hit on a multi-part story pulls in its sibling parts
            if index == 0 {
                if let Some(pattern) = config.article_id_pattern.as_deref().filter(|p| !p.is_empty()) {
                    if let Some(article_id) = root.value().classes().find(|c| c.starts_with(pattern)) {
                        let parts = Self::story_parts(document, root.value().name(), article_id);
                        debug!("Article {} has {} part(s)", article_id, parts.len());
                        if !parts.is_empty() {
                            return Ok(parts);
                        }
                    }
                }
            }
            return Ok(vec![root]);
        }

        Err(ExtractionError::ContainerNotFound(
            config.article_container_selector.clone(),
        ))
    }

    /// First element matched by `locator` in the static DOM
    fn find_first<'a>(
        document: &'a Html,
        locator: &Locator,
    ) -> Result<Option<ElementRef<'a>>, ExtractionError> {
        match locator {
            Locator::Css(css) => {
                let selector = parse_selector(css)?;
                Ok(document.select(&selector).next())
            }
            Locator::ClassPrefix(prefix) => Ok(document
                .root_element()
                .descendants()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().classes().any(|c| c.starts_with(prefix.as_str())))),
            // XPath is only meaningful against the live page
            Locator::XPath(_) => Ok(None),
        }
    }

    /// Every `tag` element carrying the exact class `article_id`
    fn story_parts<'a>(document: &'a Html, tag: &str, article_id: &str) -> Vec<ElementRef<'a>> {
        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == tag && el.value().classes().any(|c| c == article_id))
            .collect()
    }

    /// Detach every subtree matching a removal selector
    fn strip_elements(document: &mut Html, selectors: &[String]) -> Result<usize, ExtractionError> {
        let mut removed = 0;
        for css in selectors {
            let selector = parse_selector(css)?;
            let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
            for id in ids {
                if let Some(mut node) = document.tree.get_mut(id) {
                    node.detach();
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Detach small wrappers whose direct text mentions a noise keyword
    fn prune_noise_wrappers(document: &mut Html, keywords: &[String]) -> usize {
        let Some(pattern) = noise_pattern(keywords) else {
            return 0;
        };

        let ids: Vec<_> = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| PRUNABLE_WRAPPERS.contains(&el.value().name()))
            .filter(|el| {
                el.children().any(|child| match child.value() {
                    Node::Text(text) => pattern.is_match(text),
                    _ => false,
                })
            })
            .filter(|el| {
                el.text().map(|t| t.trim().chars().count()).sum::<usize>() < PRUNE_TEXT_LIMIT
            })
            .map(|el| el.id())
            .collect();

        let mut pruned = 0;
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
                pruned += 1;
            }
        }
        pruned
    }

    fn is_attached(document: &Html, el: ElementRef<'_>) -> bool {
        let root = document.tree.root().id();
        el.ancestors().any(|a| a.id() == root)
    }

    /// Allowed descendants of `root`, in document order
    fn collect_candidates(root: ElementRef<'_>, config: &DomainConfig, out: &mut Vec<TextBlock>) {
        for node in root.descendants().skip(1) {
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };
            let tag = el.value().name();
            if !config.allows_tag(tag) {
                continue;
            }
            if matches!(tag, "h3" | "h4") && Self::in_related_section(el) {
                continue;
            }
            let mut raw = String::new();
            Self::push_own_text(el, config, &mut raw);
            out.push(TextBlock {
                tag: tag.to_string(),
                text: collapse_whitespace(&raw),
            });
        }
    }

    /// Text of `el`, excluding text owned by nested allowed tags
    fn push_own_text(el: ElementRef<'_>, config: &DomainConfig, buf: &mut String) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => buf.push_str(text),
                Node::Element(element) => {
                    let name = element.name();
                    if name == "br" {
                        buf.push(' ');
                    } else if config.allows_tag(name) || SKIPPED_TAGS.contains(&name) {
                        buf.push(' ');
                    } else if let Some(child_el) = ElementRef::wrap(child) {
                        Self::push_own_text(child_el, config, buf);
                    }
                }
                _ => {}
            }
        }
    }

    fn in_related_section(el: ElementRef<'_>) -> bool {
        let Some(related) = related_class() else {
            return false;
        };
        el.ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().classes().any(|c| related.is_match(c)))
    }

    /// Length, noise and duplicate filters, first occurrence kept
    fn filter_blocks(candidates: Vec<TextBlock>, config: &DomainConfig) -> Vec<TextBlock> {
        let keywords: Vec<String> = config
            .noise_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|block| !block.text.is_empty())
            .filter(|block| block.text.chars().count() >= config.min_text_length)
            .filter(|block| !is_noise(&block.text, &keywords))
            .filter(|block| seen.insert(block.text.clone()))
            .collect()
    }
}

/// Whether `text` contains any (already lowercased) keyword
pub fn is_noise(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

/// Case-insensitive alternation of the escaped keywords
fn noise_pattern(keywords: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| regex::escape(k))
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .ok()
}

fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::InvalidSelector(format!("{}: {}", css, e)))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
