//! Built-in portal configurations

use crate::config::{DomainConfig, WaitUntil};

/// Tags used by portals whose body text lives in bare `div`s
const TAGS_WITH_DIV: [&str; 11] = [
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "b", "strong", "li", "div",
];

/// Noise common to every Gujarati/Hindi portal below
const COMMON_NOISE: [&str; 8] = [
    "advertisement",
    "also read",
    "related articles",
    "share",
    "follow us",
    "post a comment",
    "આ પણ વાંચો",
    "વધુ વાંચો",
];

/// Sandesh renders each article as `div.story.article-<id>` and pages more in
pub fn sandesh() -> DomainConfig {
    DomainConfig::builder("sandesh", "div.story[class*='article-']")
        .article_id_pattern("article-")
        .load_more_selector("//*[contains(@class,'py-4') and contains(@class,'font-normal')]")
        .noise_keywords([
            "advertisement",
            "also read",
            "related articles",
            "share",
            "follow us",
            "post a comment",
            "descriptions off",
            "subtitles",
            "alternate audio",
            "this is a modal window",
            "beginning of dialog window",
            "end of dialog window",
            "આ પણ વાંચો",
        ])
        .elements_to_remove([".inner_ar", ".related-content-alsoread"])
        .min_text_length(25)
        .wait_timeout(3000)
        .click_timeout(2000)
        .page_load_timeout(15000)
        .build()
}

/// TV9 Gujarati
pub fn tv9gujarati() -> DomainConfig {
    DomainConfig::builder("tv9gujarati", "div.detailBody")
        .allowed_tags(TAGS_WITH_DIV)
        .noise_keywords(COMMON_NOISE)
        .elements_to_remove([".trc_rbox_container", ".ad-container", ".social-share"])
        .min_text_length(25)
        .wait_timeout(5000)
        .click_timeout(2000)
        .page_load_timeout(15000)
        .wait_until(WaitUntil::DomContentLoaded)
        .build()
}

/// Gujarat Samachar
pub fn gujaratsamachar() -> DomainConfig {
    DomainConfig::builder("gujaratsamachar", ".detail-news.article-detail-news")
        .allowed_tags(TAGS_WITH_DIV)
        .noise_keywords(COMMON_NOISE)
        .elements_to_remove([".multiple.card", ".ad-container", ".social-share"])
        .min_text_length(25)
        .wait_timeout(5000)
        .click_timeout(2000)
        .page_load_timeout(15000)
        .wait_until(WaitUntil::DomContentLoaded)
        .build()
}

/// Aaj Tak, with its "और पढ़ें" expander
pub fn aajtak() -> DomainConfig {
    DomainConfig::builder("aajtak", ".content-area")
        .load_more_selector(".readmoreAction")
        .allowed_tags(TAGS_WITH_DIV)
        .noise_keywords(COMMON_NOISE)
        .elements_to_remove([".ad-container", ".social-share", ".tbl-feed-card"])
        .min_text_length(25)
        .wait_timeout(5000)
        .click_timeout(2000)
        .page_load_timeout(15000)
        .wait_until(WaitUntil::DomContentLoaded)
        .build()
}

/// Every built-in config with its hostnames
pub fn builtin_domains() -> Vec<(DomainConfig, Vec<&'static str>)> {
    vec![
        (sandesh(), vec!["sandesh.com", "www.sandesh.com"]),
        (tv9gujarati(), vec!["tv9gujarati.com", "www.tv9gujarati.com"]),
        (
            gujaratsamachar(),
            vec!["gujaratsamachar.com", "www.gujaratsamachar.com"],
        ),
        (aajtak(), vec!["aajtak.in", "www.aajtak.in"]),
    ]
}
