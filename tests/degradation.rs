//! Screens stay usable when their resources are missing or broken

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use hitscreen::fetch::{FetchResponse, MemoryFetcher};
use hitscreen::hitregion::{HitRegionLoader, LoadIssue};
use hitscreen::{Controller, ControllerContext, ControllerRegistry, Registry, Session, ShowOutcome};

fn shown_empty(id: &str) -> ShowOutcome {
    ShowOutcome::Shown { screen_id: id.to_string(), regions: 0 }
}

async fn show_play_with(fetcher: MemoryFetcher) -> ShowOutcome {
    let recorder = common::Recorder::default();
    let session = common::session_with(Arc::new(fetcher), &recorder);
    session.start().await;
    let outcome = session.manager().show("play").await;
    assert_eq!(session.active_screen().as_deref(), Some("play"));
    assert_eq!(recorder.count(), 1, "controller still starts");
    outcome
}

/// Test that a 404 hit-region document yields a screen without regions
#[tokio::test]
async fn test_missing_document() {
    let fetcher = MemoryFetcher::new();
    fetcher.insert("hitboxes/menu.json", common::MENU_HITBOXES);
    assert_eq!(show_play_with(fetcher).await, shown_empty("play"));
}

/// Test that a transport failure yields a screen without regions
#[tokio::test]
async fn test_transport_failure() {
    let fetcher = MemoryFetcher::new();
    fetcher.fail("hitboxes/play.json", "connection refused");
    assert_eq!(show_play_with(fetcher).await, shown_empty("play"));
}

/// Test that an HTML fallback page is recognized and ignored
#[tokio::test]
async fn test_html_body() {
    let fetcher = MemoryFetcher::new();
    fetcher.insert("hitboxes/play.json", "\n  <!DOCTYPE html><html><body>Not found</body></html>");
    assert_eq!(show_play_with(fetcher).await, shown_empty("play"));
}

/// Test that invalid JSON and documents without a list yield no regions
#[tokio::test]
async fn test_malformed_documents() {
    for body in ["{ not json", r#"{ "regions": [] }"#, r#"{ "hitboxes": "nope" }"#] {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("hitboxes/play.json", body);
        assert_eq!(show_play_with(fetcher).await, shown_empty("play"), "body {:?}", body);
    }
}

/// Test that non-object entries are skipped while the rest survive
#[tokio::test]
async fn test_partial_document() {
    let fetcher = MemoryFetcher::new();
    fetcher.insert(
        "hitboxes/play.json",
        r#"{ "hitboxes": [ 1, null, { "action": "go:menu", "x": "5", "y": 5, "w": 250, "h": -3 } ] }"#,
    );
    assert_eq!(
        show_play_with(fetcher).await,
        ShowOutcome::Shown { screen_id: "play".to_string(), regions: 1 }
    );
}

/// Test the loader's report for each failure class
#[tokio::test]
async fn test_loader_reports() {
    let fetcher = MemoryFetcher::new();
    fetcher
        .respond("a.json", FetchResponse { status: 500, body: "{}".to_string() })
        .fail("b.json", "timed out")
        .insert("c.json", "<html></html>")
        .insert("d.json", r#"{ "hitboxes": [ "x", { "action": "go:menu" } ] }"#);
    let loader = HitRegionLoader::new(Arc::new(fetcher));

    assert_eq!(loader.load_report(Some("a.json")).await.issue, Some(LoadIssue::Status(500)));
    assert!(matches!(loader.load_report(Some("b.json")).await.issue, Some(LoadIssue::Transport(_))));
    assert_eq!(loader.load_report(Some("c.json")).await.issue, Some(LoadIssue::HtmlBody));

    let report = loader.load_report(Some("d.json")).await;
    assert_eq!((report.regions.len(), report.skipped, report.issue), (1, 1, None));

    assert!(loader.load(None).await.is_empty());
    assert!(loader.load(Some("  ")).await.is_empty());
}

struct Failing;

#[async_trait]
impl Controller for Failing {
    async fn init(&self, _ctx: ControllerContext) -> anyhow::Result<()> {
        anyhow::bail!("asset missing")
    }
}

struct Panicking;

#[async_trait]
impl Controller for Panicking {
    async fn init(&self, _ctx: ControllerContext) -> anyhow::Result<()> {
        panic!("controller bug")
    }
}

/// Test that failing or panicking controllers neither block the screen nor retry
#[tokio::test]
async fn test_broken_controllers() {
    let registry = Registry::from_json(r#"{
        "screens": {
            "menu": { "controller": "failing" },
            "play": { "controller": "panicking" }
        }
    }"#).unwrap();
    let mut controllers = ControllerRegistry::new();
    controllers
        .register_fn("failing", || Box::new(Failing))
        .register_fn("panicking", || Box::new(Panicking));
    let session = Session::boot(registry, Arc::new(MemoryFetcher::new()), controllers);

    let (_handle, mut rx) = session.transitions().subscribe_channel();
    for id in ["menu", "play", "menu", "play"] {
        assert_eq!(session.go(id).await, hitscreen::RouteOutcome::Delegated(shown_empty(id)));
    }

    assert_eq!(session.manager().attached_controllers(), 2);
    for _ in 0..4 {
        assert!(rx.recv().await.is_some());
    }
}
