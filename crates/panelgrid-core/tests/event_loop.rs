use panelgrid_core::{EngineError, EngineEvent, MigrationOutcome, ReconcileOutcome, SaveOutcome};
use panelgrid_store::{DurableId, WorkspaceId};
use panelgrid_test_utils::Harness;
use pretty_assertions::assert_eq;

#[tokio::test(start_paused = true)]
async fn workspace_lifecycle_through_handle() {
    let h = Harness::new();
    let backend = h.backend.clone();
    let engine = h.engine.clone();
    let mut saves = h.engine.subscribe_saves();
    h.show("right-large", &[35.0, 70.0, 30.0]);
    let handle = h.engine.clone().spawn();

    let draft = WorkspaceId::provisional();
    assert_eq!(
        handle.activate(draft.clone(), "right-large").await.unwrap(),
        ReconcileOutcome::Defaults
    );

    handle.resize_stopped(draft.clone(), "right-large").await.unwrap();
    assert_eq!(saves.recv().await.unwrap().outcome, SaveOutcome::LocalOnly);
    assert!(engine.local().get(&draft).is_some());

    let saved = WorkspaceId::durable(7);
    let outcome = handle.saved(draft.clone(), saved.clone()).await.unwrap();
    assert!(outcome.is_migrated());
    assert_eq!(
        backend.record(DurableId(7)).unwrap().topology_id,
        "right-large"
    );

    assert_eq!(
        handle.activate(saved, "right-large").await.unwrap(),
        ReconcileOutcome::Local
    );
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_flushes_pending_saves() {
    let h = Harness::new();
    h.show("two-column", &[58.0, 42.0]);
    let handle = h.engine.clone().spawn();

    handle
        .resize_stopped(WorkspaceId::durable(8), "two-column")
        .await
        .unwrap();
    handle.shutdown().await.unwrap();

    assert_eq!(
        h.backend.record(DurableId(8)).unwrap().positions.width,
        "58.00,42.00"
    );
}

#[tokio::test]
async fn events_without_reply_are_processed() {
    let h = Harness::new();
    let handle = h.engine.clone().spawn();
    let tx = handle.sender();

    tx.send(EngineEvent::Activated {
        workspace: WorkspaceId::durable(9),
        topology_id: "grid-2x2".to_string(),
        reply: None,
    })
    .await
    .unwrap();
    assert_eq!(
        handle
            .saved(WorkspaceId::provisional(), WorkspaceId::durable(9))
            .await
            .unwrap(),
        MigrationOutcome::NothingToMigrate
    );
    assert_eq!(h.publisher.count(), 1);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn stopped_engine_rejects_events() {
    let h = Harness::new();
    let handle = h.engine.clone().spawn();
    let tx = handle.sender();
    tx.send(EngineEvent::Shutdown).await.unwrap();

    let err = handle
        .activate(WorkspaceId::durable(10), "two-column")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Shutdown));
}
