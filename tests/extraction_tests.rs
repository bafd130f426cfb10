//! Content extraction tests
//!
//! Built-in portal configs run against trimmed copies of their real page
//! layouts.

use newsdesk_extract::config::builtin;
use newsdesk_extract::{ContentExtractor, DomainConfig, ExtractionError};
use pretty_assertions::assert_eq;

fn sandesh_page() -> &'static str {
    r#"<!DOCTYPE html><html><head><title>Sandesh</title>
    <script>window.dataLayer = [];</script></head>
    <body>
      <nav><a href="/">Home</a></nav>
      <div class="story article-58291 px-4">
        <h1>પોરબંદરમાં ભેળસેળવાળા ડીઝલનું વેચાણ કરતા પાંચ આરોપીઓ ઝડપાયા</h1>
        <p>રાણાવાવ પંથકમાં સ્ટેટ મોનિટરિંગ સેલે દરોડો પાડીને ગોડાઉનમાંથી જથ્થો કબજે કર્યો હતો.</p>
        <div class="inner_ar"><p>આ પણ વાંચો: અન્ય સમાચાર જે અહીં દેખાવા ન જોઈએ</p></div>
        <p>Advertisement placeholder text long enough to pass the length filter</p>
        <p>Short</p>
      </div>
      <div class="related-content-alsoread"><h3>Another headline that should vanish</h3></div>
      <div class="story article-58291 px-4">
        <p>પોલીસે આરોપીઓ વિરુદ્ધ ગુનો નોંધીને વધુ તપાસ હાથ ધરી છે, એમ સૂત્રોએ જણાવ્યું.</p>
        <p>રાણાવાવ પંથકમાં સ્ટેટ મોનિટરિંગ સેલે દરોડો પાડીને ગોડાઉનમાંથી જથ્થો કબજે કર્યો હતો.</p>
      </div>
      <div class="story article-90000 px-4"><p>This paragraph belongs to the next article in the feed.</p></div>
    </body></html>"#
}

#[test]
fn test_sandesh_multi_part_story() {
    let content = ContentExtractor::extract(sandesh_page(), &builtin::sandesh()).unwrap();

    assert_eq!(content.roots, 2);
    assert_eq!(
        content.html,
        "<h1>પોરબંદરમાં ભેળસેળવાળા ડીઝલનું વેચાણ કરતા પાંચ આરોપીઓ ઝડપાયા</h1>\
         <p>રાણાવાવ પંથકમાં સ્ટેટ મોનિટરિંગ સેલે દરોડો પાડીને ગોડાઉનમાંથી જથ્થો કબજે કર્યો હતો.</p>\
         <p>પોલીસે આરોપીઓ વિરુદ્ધ ગુનો નોંધીને વધુ તપાસ હાથ ધરી છે, એમ સૂત્રોએ જણાવ્યું.</p>"
    );
    assert!(!content.html.contains("next article"));
    assert_eq!(content.blocks.len(), 3);
}

#[test]
fn test_tv9_div_text_and_removals() {
    let html = r#"<html><body>
      <div class="detailBody">
        <div>ગાંધીનગરમાં આજે રાજ્ય સરકારની મહત્વની બેઠક મળી હતી.</div>
        <div class="ad-container"><p>Sponsored links and other promoted material</p></div>
        <div class="social-share">Share on WhatsApp Share on Facebook</div>
        <ul><li>બેઠકમાં ખેડૂતો માટે નવી સહાય યોજના જાહેર કરવામાં આવી.</li></ul>
        <div>Follow us on all social platforms for the latest news</div>
      </div></body></html>"#;

    let content = ContentExtractor::extract(html, &builtin::tv9gujarati()).unwrap();
    assert_eq!(
        content.html,
        "<div>ગાંધીનગરમાં આજે રાજ્ય સરકારની મહત્વની બેઠક મળી હતી.</div>\
         <li>બેઠકમાં ખેડૂતો માટે નવી સહાય યોજના જાહેર કરવામાં આવી.</li>"
    );
}

#[test]
fn test_aajtak_readmore_body() {
    let html = r#"<div class="content-area">
        <h1>दिल्ली में बारिश से कई इलाकों में जलभराव की स्थिति बनी</h1>
        <p>मौसम विभाग ने अगले दो दिनों के लिए येलो अलर्ट जारी किया है।</p>
        <div class="tbl-feed-card"><p>You may like these stories from around the web</p></div>
        <p class="readmoreAction">और पढ़ें</p>
      </div>"#;

    let content = ContentExtractor::extract(html, &builtin::aajtak()).unwrap();
    assert_eq!(content.blocks.len(), 2);
    assert_eq!(content.blocks[0].tag, "h1");
    assert!(content.text.contains("येलो अलर्ट"));
}

#[test]
fn test_stale_selector_is_container_not_found() {
    let html = r#"<div class="redesigned-body"><p>New layout paragraph that is long.</p></div>"#;
    let err = ContentExtractor::extract(html, &builtin::gujaratsamachar()).unwrap_err();
    assert_eq!(
        err,
        ExtractionError::ContainerNotFound(".detail-news.article-detail-news".to_string())
    );
}

#[test]
fn test_everything_filtered_is_empty_result() {
    let html = r#"<div class="content-area"><p>Advertisement</p><p>ok</p></div>"#;
    let err = ContentExtractor::extract(html, &builtin::aajtak()).unwrap_err();
    assert_eq!(err, ExtractionError::EmptyResult);
}

#[test]
fn test_scripts_and_styles_never_leak() {
    let config = DomainConfig::builder("plain", "main")
        .allowed_tags(["p"])
        .min_text_length(5)
        .build();
    let html = r#"<main><p>Visible text <script>var hidden = 1;</script>
        <style>.x{color:red}</style>continues here</p></main>"#;
    let content = ContentExtractor::extract(html, &config).unwrap();
    assert_eq!(content.html, "<p>Visible text continues here</p>");
}

#[test]
fn test_markup_in_text_is_escaped() {
    let config = DomainConfig::builder("plain", "main")
        .allowed_tags(["p"])
        .min_text_length(1)
        .build();
    let html = "<main><p>Tom &amp; Jerry &lt;3 cheese</p></main>";
    let content = ContentExtractor::extract(html, &config).unwrap();
    assert_eq!(content.html, "<p>Tom &amp; Jerry &lt;3 cheese</p>");
    assert_eq!(content.text, "Tom & Jerry <3 cheese");
}

#[test]
fn test_word_and_char_counts() {
    let config = DomainConfig::builder("plain", "main")
        .allowed_tags(["p"])
        .min_text_length(1)
        .build();
    let content =
        ContentExtractor::extract("<main><p>one two</p><p>three</p></main>", &config).unwrap();
    assert_eq!(content.word_count, 3);
    assert_eq!(content.text, "one two\n\nthree");
    assert_eq!(content.char_count, 14);
}
