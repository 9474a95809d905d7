//! Pointer delegation from the root container to the router

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hitscreen::document::lock_document;
use hitscreen::hitregion::{ACTION_ATTR, REGION_CLASS};
use hitscreen::input::{Dispatch, PointerEvent, PointerKind};
use hitscreen::{ActionError, RouteOutcome, RouteRejection, ShowOutcome};

/// Test that a tap on a region navigates to its target
#[tokio::test]
async fn test_tap_navigates() {
    let (session, _) = common::session();
    session.start().await;

    let dispatch = session.tap(20.0, 20.0).await;
    assert_eq!(
        dispatch,
        Dispatch::Routed(RouteOutcome::Delegated(ShowOutcome::Shown {
            screen_id: "play".to_string(),
            regions: 2,
        }))
    );
    assert_eq!(session.active_screen().as_deref(), Some("play"));

    session.tap(5.0, 5.0).await;
    assert_eq!(session.active_screen().as_deref(), Some("menu"));
}

/// Test that pointer-down on a region is suppressed and does not navigate
#[tokio::test]
async fn test_pointer_down_is_suppressed() {
    let (session, _) = common::session();
    session.start().await;

    let mut down = session.input().pointer_at(PointerKind::Down, 20.0, 20.0).unwrap();
    assert_eq!(session.input().handle(&mut down).await, Dispatch::Suppressed);
    assert!(down.default_prevented());
    assert!(down.propagation_stopped());
    assert_eq!(session.active_screen().as_deref(), Some("menu"));
}

/// Test that a click on the inner part of a region resolves to the region
#[tokio::test]
async fn test_click_inside_region_descendant() {
    let (session, _) = common::session();
    session.start().await;

    let region = session.input().locate(20.0, 50.0).unwrap();
    let inner = {
        let mut doc = lock_document(session.document());
        assert!(doc.has_class(region, REGION_CLASS));
        let icon = doc.create_element("span");
        doc.append_child(region, icon);
        icon
    };

    let mut click = PointerEvent::new(PointerKind::Click, inner);
    assert!(matches!(session.input().handle(&mut click).await, Dispatch::Routed(_)));
    assert_eq!(session.active_screen().as_deref(), Some("settings"));
}

/// Test that clicks away from every region are left alone
#[tokio::test]
async fn test_click_outside_regions_is_ignored() {
    let (session, _) = common::session();
    session.start().await;

    let mut click = session.input().pointer_at(PointerKind::Click, 50.0, 90.0).unwrap();
    assert_eq!(session.input().handle(&mut click).await, Dispatch::Ignored);
    assert!(!click.default_prevented());
    assert_eq!(session.active_screen().as_deref(), Some("menu"));
}

/// Test that malformed and unknown actions never change the screen
#[tokio::test]
async fn test_bad_actions_are_dropped() {
    let (session, _) = common::session();
    session.start().await;

    assert_eq!(session.tap(70.0, 20.0).await, Dispatch::Invalid(ActionError::MissingTarget));
    assert_eq!(
        session.tap(70.0, 50.0).await,
        Dispatch::Routed(RouteOutcome::Rejected(RouteRejection::UnknownScreen("nowhere".to_string())))
    );
    assert_eq!(session.active_screen().as_deref(), Some("menu"));
}

/// Test that elements outside the root container are not handled
#[tokio::test]
async fn test_detached_region_is_ignored() {
    let (session, _) = common::session();
    session.start().await;

    let detached = {
        let mut doc = lock_document(session.document());
        let button = doc.create_element("button");
        doc.add_class(button, REGION_CLASS);
        doc.set_attr(button, ACTION_ATTR, "go:play");
        button
    };

    let mut click = PointerEvent::new(PointerKind::Click, detached);
    assert_eq!(session.input().handle(&mut click).await, Dispatch::Ignored);
    assert_eq!(session.active_screen().as_deref(), Some("menu"));
}

/// Test that missed clicks are offered to pointer hooks in order
#[tokio::test]
async fn test_pointer_hooks_claim_misses() {
    let (session, _) = common::session();
    session.start().await;

    let calls = Arc::new(AtomicUsize::new(0));
    let hooks = session.manager().pointer_hooks();
    let _first = {
        let calls = Arc::clone(&calls);
        hooks.register(move |point| {
            calls.fetch_add(1, Ordering::SeqCst);
            point.screen_id == "menu" && point.y > 80.0
        })
    };
    let _second = hooks.register(|_| false);

    assert_eq!(session.tap(50.0, 90.0).await, Dispatch::Claimed);
    assert_eq!(session.tap(50.0, 70.0).await, Dispatch::Ignored);
    // Region hits never reach the hooks
    session.tap(20.0, 20.0).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Test that nothing can be located before a screen is shown
#[tokio::test]
async fn test_no_active_screen() {
    let (session, _) = common::session();
    assert_eq!(session.input().locate(10.0, 10.0), None);
    assert_eq!(session.tap(10.0, 10.0).await, Dispatch::Ignored);
}
