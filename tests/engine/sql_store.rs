//! libsql store behavior: upserts, timestamps and built-in role provisioning.

use resperm::builtin::actions::*;
use resperm::store::{RoleChange, RoleDefinition};
use resperm::{PermissionStore, Principal, RoleStore, SqlStore};

use super::{ORG, stock_services};

#[tokio::test]
async fn upsert_keeps_created_and_moves_updated_on_change() {
    let store = SqlStore::open(":memory:").await.unwrap();
    let user = Principal::User(7);

    let first = store
        .set_assignment("dashboards", ORG, "42", &user, Some("View"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.created, first.updated);

    let same = store
        .set_assignment("dashboards", ORG, "42", &user, Some("View"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(same, first);

    let changed = store
        .set_assignment("dashboards", ORG, "42", &user, Some("Admin"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(changed.created, first.created);
    assert!(changed.updated >= first.updated);
    assert_eq!(changed.level, "Admin");

    let rows = store.list_assignments("dashboards", ORG, "42").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].principal().unwrap(), user);
}

#[tokio::test]
async fn delete_of_missing_assignment_succeeds() {
    let store = SqlStore::open(":memory:").await.unwrap();
    let removed = store
        .set_assignment("folders", ORG, "5", &Principal::Team(3), None)
        .await
        .unwrap();
    assert!(removed.is_none());
}

#[tokio::test]
async fn provisioning_creates_each_role_once() {
    let (store, services) = stock_services().await;
    services.provision_all().await.unwrap();

    let reader = store
        .get_role("Dashboard permission reader")
        .await
        .unwrap()
        .expect("reader role");
    assert_eq!(reader.group, "Dashboards");
    assert_eq!(reader.actions.len(), 1);
    assert!(reader.actions.contains(DASHBOARDS_READ));

    let writer = store
        .get_role("Folder permission writer")
        .await
        .unwrap()
        .expect("writer role");
    assert_eq!(writer.group, "Folders");
    assert!(writer.actions.contains(FOLDERS_PERMISSIONS_WRITE));
    assert!(writer.actions.contains(DASHBOARDS_PERMISSIONS_WRITE));

    // Second start leaves everything in place.
    services.provision_all().await.unwrap();
    let again = store
        .get_role("Dashboard permission reader")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again, reader);
}

#[tokio::test]
async fn drifted_role_is_rewritten_with_same_uid() {
    let store = SqlStore::open(":memory:").await.unwrap();
    let mut role = RoleDefinition {
        name: "Report permission reader".to_string(),
        group: "Reports".to_string(),
        actions: ["reports:read"].into_iter().collect(),
    };

    assert_eq!(store.create_or_update_role(&role).await.unwrap(), RoleChange::Created);
    assert_eq!(
        store.create_or_update_role(&role).await.unwrap(),
        RoleChange::Unchanged
    );
    let original = store.get_role(&role.name).await.unwrap().unwrap();

    role.actions.insert("reports:export");
    assert_eq!(store.create_or_update_role(&role).await.unwrap(), RoleChange::Updated);
    let rewritten = store.get_role(&role.name).await.unwrap().unwrap();
    assert_eq!(rewritten.uid, original.uid);
    assert_eq!(rewritten.actions, role.actions);

    assert!(store.get_role("missing").await.unwrap().is_none());
}
