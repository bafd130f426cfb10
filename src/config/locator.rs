//! Element locators shared by the renderer and the extractor
//!
//! A configured selector string is either CSS or XPath. A class prefix
//! locator is synthesized from `article_id_pattern` and only ever used as a
//! fallback.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an element is found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// XPath expression (live DOM only)
    XPath(String),
    /// Any element having a class that starts with the prefix
    ClassPrefix(String),
}

impl Locator {
    /// Classify a configured selector string
    pub fn parse(selector: &str) -> Self {
        let trimmed = selector.trim();
        if trimmed.starts_with('/') || trimmed.starts_with('(') {
            Locator::XPath(trimmed.to_string())
        } else {
            Locator::Css(trimmed.to_string())
        }
    }

    /// JavaScript expression evaluating to the first match or `null`
    pub fn js_query(&self) -> String {
        match self {
            Locator::Css(css) => format!("document.querySelector({})", js_string(css)),
            Locator::XPath(xpath) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(xpath)
            ),
            Locator::ClassPrefix(prefix) => format!(
                "(Array.from(document.querySelectorAll('[class]')).find(el => Array.from(el.classList).some(c => c.startsWith({}))) || null)",
                js_string(prefix)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{}", s),
            Locator::XPath(s) => write!(f, "xpath:{}", s),
            Locator::ClassPrefix(s) => write!(f, "class^={}", s),
        }
    }
}

/// Quote `value` as a JavaScript string literal
fn js_string(value: &str) -> String {
    // JSON string literals are valid JS string literals
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css_and_xpath() {
        assert_eq!(
            Locator::parse("div.story[class*='article-']"),
            Locator::Css("div.story[class*='article-']".to_string())
        );
        assert_eq!(
            Locator::parse("//*[contains(@class,'py-4')]"),
            Locator::XPath("//*[contains(@class,'py-4')]".to_string())
        );
        assert_eq!(
            Locator::parse("(//button)[1]"),
            Locator::XPath("(//button)[1]".to_string())
        );
    }

    #[test]
    fn test_js_query_escapes_quotes() {
        let js = Locator::Css("a[title=\"x\"]".to_string()).js_query();
        assert_eq!(js, r#"document.querySelector("a[title=\"x\"]")"#);
    }

    #[test]
    fn test_class_prefix_query() {
        let js = Locator::ClassPrefix("article-".to_string()).js_query();
        assert!(js.contains("startsWith(\"article-\")"));
        assert!(js.ends_with("|| null)"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Locator::ClassPrefix("a-".into()).to_string(), "class^=a-");
    }
}
