//! Extraction pipeline tests
//!
//! A scripted renderer stands in for Chrome and counts how often it is
//! asked to render.

use newsdesk_extract::{
    DomainConfig, DomainRegistry, Error, ExtractionError, ExtractionPipeline, PageRenderer,
    RenderError, RenderRequest, ResultCache,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const ARTICLE: &str = r#"<html><body><article class="body">
    <h1>Title Here</h1><p>Short</p>
    <p>This is a long enough paragraph.</p>
    <p>Please see our advertisement below</p>
</article></body></html>"#;

#[derive(Clone)]
enum Script {
    Html(&'static str),
    Fail(RenderError),
    Slow(Duration),
}

struct ScriptedRenderer {
    script: Script,
    renders: Arc<AtomicUsize>,
}

impl ScriptedRenderer {
    fn new(script: Script) -> (Self, Arc<AtomicUsize>) {
        let renders = Arc::new(AtomicUsize::new(0));
        (
            Self {
                script,
                renders: Arc::clone(&renders),
            },
            renders,
        )
    }
}

impl PageRenderer for ScriptedRenderer {
    async fn render(&self, _request: &RenderRequest) -> newsdesk_extract::Result<String> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Html(html) => {
                // Yield so concurrent callers overlap
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(html.to_string())
            }
            Script::Fail(err) => Err(err.clone().into()),
            Script::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(ARTICLE.to_string())
            }
        }
    }
}

fn news_config() -> DomainConfig {
    DomainConfig::builder("news", "article.body")
        .allowed_tags(["h1", "p"])
        .noise_keywords(["advertisement"])
        .min_text_length(10)
        .build()
}

fn pipeline(script: Script) -> (ExtractionPipeline<ScriptedRenderer>, Arc<AtomicUsize>) {
    let registry = Arc::new(DomainRegistry::new());
    registry
        .register(news_config(), &["news.example", "www.news.example"])
        .unwrap();
    let (renderer, renders) = ScriptedRenderer::new(script);
    let pipeline = ExtractionPipeline::new(renderer, registry, Arc::new(ResultCache::default()));
    (pipeline, renders)
}

#[tokio::test]
async fn test_extract_scenario_output() {
    let (pipeline, _) = pipeline(Script::Html(ARTICLE));
    let result = pipeline
        .extract("https://news.example/story/1", None, None)
        .await
        .unwrap();

    assert_eq!(
        result.content,
        "<h1>Title Here</h1><p>This is a long enough paragraph.</p>"
    );
    assert_eq!(result.metadata.url, "https://news.example/story/1");
    assert_eq!(result.metadata.domain_name, "news");
    assert_eq!(result.metadata.content_length, result.content.chars().count());
}

#[tokio::test]
async fn test_second_call_within_ttl_skips_render() {
    let (pipeline, renders) = pipeline(Script::Html(ARTICLE));
    let first = pipeline
        .extract("https://news.example/story/1", None, None)
        .await
        .unwrap();
    let second = pipeline
        .extract("https://news.example/story/1#comments", None, None)
        .await
        .unwrap();

    assert_eq!(first.content, second.content);
    assert_eq!(first.metadata.extracted_at, second.metadata.extracted_at);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_host_is_config_not_found() {
    let (pipeline, renders) = pipeline(Script::Html(ARTICLE));
    let err = pipeline
        .extract("https://unknown.example/a", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound(_)));
    assert_eq!(err.status_code(), 404);
    assert_eq!(renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_http_url_rejected() {
    let (pipeline, renders) = pipeline(Script::Html(ARTICLE));
    let err = pipeline
        .extract("ftp://news.example/story", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
    assert_eq!(renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_adhoc_config_used_for_unknown_host() {
    let (pipeline, _) = pipeline(Script::Html(ARTICLE));
    let adhoc = DomainConfig::builder("adhoc", "article")
        .allowed_tags(["h1"])
        .min_text_length(1)
        .build();
    let result = assert_ok!(
        pipeline
            .extract("https://unknown.example/a", None, Some(adhoc))
            .await
    );
    assert_eq!(result.content, "<h1>Title Here</h1>");
    assert_eq!(result.metadata.domain_name, "adhoc");
}

#[tokio::test]
async fn test_render_errors_surface_and_are_not_cached() {
    let (pipeline, renders) = pipeline(Script::Fail(RenderError::Network("dns".into())));
    for _ in 0..2 {
        let err = pipeline
            .extract("https://news.example/story/1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Render(RenderError::Network(_))));
    }
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.cache_stats().size, 0);
}

#[tokio::test]
async fn test_extraction_errors_surface_verbatim() {
    let (pipeline, _) = pipeline(Script::Html("<html><body><main>moved</main></body></html>"));
    let err = pipeline
        .extract("https://news.example/story/1", None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::ContainerNotFound(_))
    ));
    assert_eq!(pipeline.cache_stats().size, 0);
}

#[tokio::test]
async fn test_request_timeout() {
    let (pipeline, _) = pipeline(Script::Slow(Duration::from_secs(5)));
    let pipeline = pipeline.with_request_timeout(Duration::from_millis(50));
    let err = assert_err!(
        pipeline
            .extract("https://news.example/story/1", None, None)
            .await
    );
    assert!(matches!(err, Error::Render(RenderError::Timeout(50))));
    assert_eq!(pipeline.cache_stats().size, 0);
}

#[tokio::test]
async fn test_concurrent_misses_are_coalesced() {
    let (pipeline, renders) = pipeline(Script::Html(ARTICLE));
    let pipeline = Arc::new(pipeline);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                pipeline
                    .extract("https://news.example/story/1", None, None)
                    .await
            })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_coalescing_can_be_disabled() {
    let (pipeline, renders) = pipeline(Script::Html(ARTICLE));
    let pipeline = pipeline.with_coalescing(false);

    let url = "https://news.example/story/1";
    let (a, b) = tokio::join!(
        pipeline.extract(url, None, None),
        pipeline.extract(url, None, None)
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_registration_and_cache_admin() {
    let (pipeline, _) = pipeline(Script::Html(ARTICLE));
    pipeline
        .register_domain(
            DomainConfig::builder("mirror", "article.body")
                .allowed_tags(["p"])
                .min_text_length(10)
                .build(),
            &["mirror.example"],
        )
        .unwrap();
    assert_eq!(pipeline.list_domains(false).domains, vec!["mirror", "news"]);

    pipeline
        .extract("https://mirror.example/a", None, None)
        .await
        .unwrap();
    pipeline
        .extract("https://news.example/a", None, None)
        .await
        .unwrap();

    let stats = pipeline.cache_stats();
    assert_eq!(stats.size, 2);
    assert!(stats.entries.iter().all(|e| e.url_hash.len() == 8));
    assert_eq!(pipeline.cache_clear(), 2);
    assert_eq!(pipeline.cache_stats().size, 0);
}

#[tokio::test]
async fn test_explicit_domain_is_not_served_another_domains_result() {
    let (pipeline, renders) = pipeline(Script::Html(ARTICLE));
    pipeline
        .register_domain(
            DomainConfig::builder("paras", "article.body")
                .allowed_tags(["p"])
                .noise_keywords(["advertisement"])
                .min_text_length(10)
                .build(),
            &["paras.example"],
        )
        .unwrap();

    let url = "https://news.example/story/1";
    let first = pipeline.extract(url, None, None).await.unwrap();
    let second = pipeline.extract(url, Some("paras"), None).await.unwrap();

    assert_eq!(first.metadata.domain_name, "news");
    assert_eq!(second.metadata.domain_name, "paras");
    assert_eq!(second.content, "<p>This is a long enough paragraph.</p>");
    assert_eq!(renders.load(Ordering::SeqCst), 2);

    // Each config now has its own warm entry
    pipeline.extract(url, Some("paras"), None).await.unwrap();
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}
