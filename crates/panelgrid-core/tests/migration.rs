use chrono::Duration as ChronoDuration;
use panelgrid_codec::PercentageVector;
use panelgrid_core::{MigrationOutcome, ReconcileOutcome, SaveOutcome};
use panelgrid_store::{DurableId, TemplateGridSizes, WorkspaceId};
use panelgrid_test_utils::Harness;
use pretty_assertions::assert_eq;
use std::time::Duration;

fn entry(workspace: &WorkspaceId, topology_id: &str, values: &[f64]) -> TemplateGridSizes {
    TemplateGridSizes::new(
        workspace.clone(),
        topology_id,
        &PercentageVector::new(values.to_vec()),
    )
}

#[tokio::test]
async fn first_save_moves_layout_to_durable_id() {
    let h = Harness::new();
    let old = WorkspaceId::provisional();
    let new = WorkspaceId::durable(42);
    h.engine.local().put(entry(&old, "left-large", &[45.0, 50.0, 50.0]));

    let outcome = h.engine.on_workspace_saved(&old, &new).await;

    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            kept_existing: false,
            remote_written: true,
        }
    );
    assert!(h.engine.local().get(&old).is_none());
    let moved = h.engine.local().get(&new).unwrap();
    assert_eq!(moved.workspace_id, new);
    assert_eq!(moved.percentage_vector().to_csv(), "45.00,50.00,50.00");

    let remote = h.backend.record(DurableId(42)).unwrap();
    assert_eq!(remote.topology_id, "left-large");
    assert!(h.engine.slot(&old).is_none());
}

#[tokio::test]
async fn migration_is_idempotent() {
    let h = Harness::new();
    let old = WorkspaceId::provisional();
    let new = WorkspaceId::durable(43);
    h.engine.local().put(entry(&old, "two-column", &[60.0, 40.0]));

    assert!(h.engine.on_workspace_saved(&old, &new).await.is_migrated());
    assert_eq!(
        h.engine.on_workspace_saved(&old, &new).await,
        MigrationOutcome::NothingToMigrate
    );
    assert_eq!(h.backend.write_count(), 1);
    assert_eq!(h.engine.local().len(), 1);
}

#[tokio::test]
async fn nothing_stored_means_nothing_to_migrate() {
    let h = Harness::new();
    let outcome = h
        .engine
        .on_workspace_saved(&WorkspaceId::provisional(), &WorkspaceId::durable(44))
        .await;
    assert_eq!(outcome, MigrationOutcome::NothingToMigrate);
    assert_eq!(h.backend.write_count(), 0);
}

#[tokio::test]
async fn same_id_is_a_no_op() {
    let h = Harness::new();
    let ws = WorkspaceId::durable(45);
    h.engine.local().put(entry(&ws, "two-row", &[50.0, 50.0]));

    assert_eq!(
        h.engine.on_workspace_saved(&ws, &ws).await,
        MigrationOutcome::NothingToMigrate
    );
    assert!(h.engine.local().get(&ws).is_some());
}

#[tokio::test]
async fn newer_entry_under_new_id_is_kept() {
    let h = Harness::new();
    let old = WorkspaceId::provisional();
    let new = WorkspaceId::durable(46);
    let stale = entry(&old, "two-column", &[20.0, 80.0]);
    let fresh = TemplateGridSizes::at(
        new.clone(),
        "two-column",
        &PercentageVector::new(vec![75.0, 25.0]),
        stale.updated_at + ChronoDuration::seconds(5),
    );
    h.engine.local().put(stale);
    h.engine.local().put(fresh);

    let outcome = h.engine.on_workspace_saved(&old, &new).await;

    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            kept_existing: true,
            remote_written: true,
        }
    );
    assert_eq!(
        h.engine.local().get(&new).unwrap().percentage_vector().to_csv(),
        "75.00,25.00"
    );
    assert_eq!(
        h.backend.record(DurableId(46)).unwrap().positions.width,
        "75.00,25.00"
    );
    assert!(h.engine.local().get(&old).is_none());
}

#[tokio::test]
async fn failed_durable_write_still_rekeys_locally() {
    let h = Harness::new();
    let old = WorkspaceId::provisional();
    let new = WorkspaceId::durable(47);
    h.engine.local().put(entry(&old, "two-column", &[60.0, 40.0]));
    h.backend.fail_next_writes(10);

    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        h.engine.on_workspace_saved(&old, &new),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            kept_existing: false,
            remote_written: false,
        }
    );
    assert!(h.engine.local().get(&new).is_some());
    assert!(h.engine.local().get(&old).is_none());
}

#[tokio::test(start_paused = true)]
async fn pending_save_follows_new_id() {
    let h = Harness::new();
    let old = WorkspaceId::provisional();
    let new = WorkspaceId::durable(48);
    let mut saves = h.engine.subscribe_saves();
    h.engine.local().put(entry(&old, "two-column", &[50.0, 50.0]));
    h.show("two-column", &[62.0, 38.0]);

    h.engine.on_resize_stop(old.clone(), "two-column");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.engine.on_workspace_saved(&old, &new).await.is_migrated());

    let report = saves.recv().await.unwrap();
    assert_eq!(report.workspace, new);
    assert_eq!(report.outcome, SaveOutcome::Written);
    assert_eq!(
        h.backend.record(DurableId(48)).unwrap().positions.width,
        "62.00,38.00"
    );
    assert!(h.engine.local().get(&old).is_none());
}

#[tokio::test]
async fn migrated_layout_reconciles_from_local() {
    let h = Harness::new();
    let old = WorkspaceId::provisional();
    let new = WorkspaceId::durable(49);
    h.engine.local().put(entry(&old, "three-row", &[30.0, 30.0, 40.0]));

    h.engine.on_workspace_saved(&old, &new).await;

    assert_eq!(
        h.engine.on_workspace_activated(&new, "three-row").await,
        ReconcileOutcome::Local
    );
    assert_eq!(h.backend.read_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn resize_under_migrated_id_is_dropped() {
    let h = Harness::new();
    let old = WorkspaceId::provisional();
    let new = WorkspaceId::durable(50);
    h.engine.local().put(entry(&old, "two-column", &[50.0, 50.0]));
    assert!(h.engine.on_workspace_saved(&old, &new).await.is_migrated());
    let writes = h.backend.write_count();

    h.show("two-column", &[70.0, 30.0]);
    h.engine.on_resize_stop(old.clone(), "two-column");
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(h.engine.slot(&old).is_none());
    assert!(h.engine.local().get(&old).is_none());
    assert_eq!(h.engine.flush(&old).await, None);
    assert_eq!(h.backend.write_count(), writes);
    assert_eq!(
        h.engine.local().get(&new).unwrap().percentage_vector().to_csv(),
        "50.00,50.00"
    );
}
