//! The built-in hunt controller driven through a session

use std::sync::Arc;
use std::time::Duration;

use hitscreen::controllers::HuntController;
use hitscreen::controllers::hunt::{TargetMarker, read_targets};
use hitscreen::document::lock_document;
use hitscreen::fetch::MemoryFetcher;
use hitscreen::input::Dispatch;
use hitscreen::{ControllerRegistry, Registry, Session};

const REGISTRY: &str = r#"{
    "start_screen": "menu",
    "screens": {
        "menu": {},
        "hunt": { "hitboxes": "hitboxes/hunt.json", "controller": "hunt" }
    }
}"#;

const HUNT_HITBOXES: &str = r#"{
    "hitboxes": [ { "id": "back", "action": "go:menu", "x": 0, "y": 0, "w": 10, "h": 10 } ]
}"#;

fn session() -> Session {
    let fetcher = MemoryFetcher::new();
    fetcher.insert("hitboxes/hunt.json", HUNT_HITBOXES);

    let mut controllers = ControllerRegistry::new();
    controllers.register_fn(HuntController::ID, || {
        Box::new(
            HuntController::new()
                .with_tick(Duration::from_millis(10))
                .with_spawn_every(200)
                .with_seed(7),
        )
    });
    Session::boot(Registry::from_json(REGISTRY).unwrap(), Arc::new(fetcher), controllers)
}

fn targets(session: &Session) -> Vec<TargetMarker> {
    let container = session.manager().container("hunt").unwrap();
    read_targets(&lock_document(session.document()), container)
}

/// Poll until a target is fully on screen
async fn wait_for_visible_target(session: &Session) -> Option<TargetMarker> {
    for _ in 0..200 {
        let visible = targets(session).into_iter().find(|t| {
            let (x, _) = t.center();
            (10.0..=90.0).contains(&x)
        });
        if visible.is_some() {
            return visible;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}

/// Test that targets appear while the hunt screen is active and vanish when it is left
#[tokio::test]
async fn test_targets_follow_screen() {
    let session = session();
    session.start().await;
    session.go("hunt").await;

    let target = wait_for_visible_target(&session).await.expect("a target should cross the screen");
    assert!(!target.kind.is_empty());
    assert!((28.0..=72.0).contains(&target.y));

    session.go("menu").await;
    assert!(targets(&session).is_empty());

    // Nothing respawns in the background
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(targets(&session).is_empty());

    session.go("hunt").await;
    assert!(wait_for_visible_target(&session).await.is_some());
}

/// Test that a click on a target is claimed as a shot and one elsewhere is not
#[tokio::test]
async fn test_shooting_targets() {
    let session = session();
    session.go("hunt").await;

    assert_eq!(session.tap(50.0, 95.0).await, Dispatch::Ignored);

    let target = wait_for_visible_target(&session).await.expect("a target should cross the screen");
    let (x, y) = target.center();
    assert_eq!(session.tap(x, y).await, Dispatch::Claimed);
    assert!(targets(&session).is_empty(), "a hit target is removed");

    // Regions still win over the hunt
    assert!(matches!(session.tap(5.0, 5.0).await, Dispatch::Routed(_)));
    assert_eq!(session.active_screen().as_deref(), Some("menu"));
}
