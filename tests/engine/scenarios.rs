//! End-to-end grant, list and revoke flows on the stock kinds.

use resperm::builtin::actions::*;
use resperm::level::Admin;
use resperm::{ActionSet, BasicRole, Error, PermissionStore, Principal, PrincipalKind};

use super::{DASHBOARD_ID, FOLDER_ID, ORG, stock_services};

fn set(actions: &[&str]) -> ActionSet {
    actions.iter().copied().collect()
}

/// Granting Edit to user 7 on dashboard 42 lists exactly one assignment
/// carrying the Edit action set.
#[tokio::test]
async fn dashboard_edit_grant_is_listed_with_actions() {
    let (_, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();

    dashboards
        .set_permission(ORG, "42", &Principal::User(7), Some("Edit"))
        .await
        .unwrap();

    let listed = dashboards.list_permissions(ORG, "42").await.unwrap();
    assert_eq!(listed.len(), 1);
    let grant = &listed[0];
    assert_eq!(grant.assignment.principal_kind, PrincipalKind::User);
    assert_eq!(grant.assignment.principal_id, "7");
    assert_eq!(grant.assignment.level, "Edit");
    assert_eq!(
        grant.actions,
        set(&[DASHBOARDS_READ, DASHBOARDS_WRITE, DASHBOARDS_DELETE, DASHBOARDS_EDIT])
    );
}

/// Folder Admin carries both the folder admin actions and every dashboard
/// admin action.
#[tokio::test]
async fn folder_admin_includes_dashboard_admin() {
    let (_, services) = stock_services().await;
    let folders = services.folders().unwrap();
    let dashboards = services.dashboards().unwrap();

    let grant = folders
        .grant::<Admin>(ORG, "5", &Principal::Team(3))
        .await
        .unwrap();

    assert!(grant.actions.contains(FOLDERS_PERMISSIONS_WRITE));
    assert!(grant.actions.contains(FOLDERS_PERMISSIONS_READ));
    assert!(dashboards.resolve("Admin").unwrap().is_subset(&grant.actions));
}

/// A non-numeric id is rejected before the store is touched.
#[tokio::test]
async fn non_numeric_resource_id_is_invalid_input() {
    let (store, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();

    let err = dashboards
        .set_user_permission(ORG, "abc", 7, Some("View"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let held = store
        .list_by_principal("dashboards", ORG, &Principal::User(7))
        .await
        .unwrap();
    assert!(held.is_empty());
}

/// A dashboard that is not a folder does not exist as far as the folders
/// kind is concerned.
#[tokio::test]
async fn plain_dashboard_is_not_a_folder() {
    let (_, services) = stock_services().await;
    let folders = services.folders().unwrap();

    let err = folders
        .set_user_permission(ORG, &DASHBOARD_ID.to_string(), 7, Some("View"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = folders.list_permissions(ORG, "999").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn repeated_grant_is_a_no_op() {
    let (_, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();

    let first = dashboards
        .set_user_permission(ORG, "42", 7, Some("View"))
        .await
        .unwrap()
        .unwrap();
    let second = dashboards
        .set_user_permission(ORG, "42", 7, Some("View"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(dashboards.list_permissions(ORG, "42").await.unwrap().len(), 1);
}

#[tokio::test]
async fn new_level_replaces_old_one() {
    let (_, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();
    let editors = BasicRole::Editor;

    dashboards
        .set_built_in_role_permission(ORG, "42", editors, Some("View"))
        .await
        .unwrap();
    dashboards
        .set_built_in_role_permission(ORG, "42", editors, Some("Admin"))
        .await
        .unwrap();

    let listed = dashboards.list_permissions(ORG, "42").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].assignment.level, "Admin");
    assert_eq!(listed[0].assignment.principal_id, "Editor");
}

#[tokio::test]
async fn revoke_removes_principal_from_listing() {
    let (_, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();

    dashboards
        .set_user_permission(ORG, "42", 7, Some("Edit"))
        .await
        .unwrap();
    dashboards
        .set_team_permission(ORG, "42", 3, Some("View"))
        .await
        .unwrap();
    dashboards
        .revoke(ORG, "42", &Principal::User(7))
        .await
        .unwrap();

    let listed = dashboards.list_permissions(ORG, "42").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].assignment.principal_kind, PrincipalKind::Team);

    // Revoking something that was never granted is fine.
    dashboards
        .set_user_permission(ORG, "42", 8, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_level_leaves_store_untouched() {
    let (store, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();

    let err = dashboards
        .set_user_permission(ORG, "42", 7, Some("Owner"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownLevel { ref level, .. } if level == "Owner"));
    assert!(
        store
            .list_assignments("dashboards", ORG, "42")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn kinds_and_orgs_do_not_share_assignments() {
    let (_, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();
    let folders = services.folders().unwrap();

    // Folder 5 is also a dashboard row.
    dashboards
        .set_user_permission(ORG, "5", 7, Some("Admin"))
        .await
        .unwrap();
    assert!(folders.list_permissions(ORG, "5").await.unwrap().is_empty());

    // Other org cannot see dashboard 42 at all.
    let err = dashboards.list_permissions(2, "42").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn assignments_for_principal_span_instances() {
    let (_, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();
    let folders = services.folders().unwrap();
    let team = Principal::Team(3);

    dashboards.set_permission(ORG, "42", &team, Some("View")).await.unwrap();
    dashboards.set_permission(ORG, "5", &team, Some("Edit")).await.unwrap();
    folders.set_permission(ORG, "5", &team, Some("Admin")).await.unwrap();

    let held = dashboards
        .list_assignments_for_principal(ORG, &team)
        .await
        .unwrap();
    let ids: Vec<&str> = held.iter().map(|a| a.resource_id.as_str()).collect();
    assert_eq!(ids, ["42", "5"]);

    let held = folders
        .list_assignments_for_principal(ORG, &team)
        .await
        .unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].level, "Admin");

    let err = folders
        .list_assignments_for_principal(ORG, &Principal::Team(0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

/// Concurrent grants for the same principal end with exactly one of the
/// submitted levels.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_grants_converge() {
    let (_, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();

    let tasks: Vec<_> = ["View", "Admin", "Edit", "View"]
        .into_iter()
        .map(|level| {
            let service = dashboards.clone();
            tokio::spawn(async move {
                let user = Principal::User(7);
                service.set_permission(ORG, "42", &user, Some(level)).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let listed = dashboards.list_permissions(ORG, "42").await.unwrap();
    assert_eq!(listed.len(), 1);
    let level = listed[0].assignment.level.as_str();
    assert!(["View", "Edit", "Admin"].contains(&level), "unexpected level {level}");
    assert_eq!(&listed[0].actions, dashboards.resolve(level).unwrap());
}

/// Different spellings of one numeric id address the same dashboard, so the
/// user still holds a single assignment on it.
#[tokio::test]
async fn id_spellings_resolve_to_one_assignment() {
    let (_, services) = stock_services().await;
    let dashboards = services.dashboards().unwrap();
    let user = Principal::User(7);

    for spelling in ["42", "042", " 42", "+42"] {
        let granted = dashboards
            .set_permission(ORG, spelling, &user, Some("View"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(granted.assignment.resource_id, "42");
    }

    let held = dashboards
        .list_assignments_for_principal(ORG, &user)
        .await
        .unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].resource_id, DASHBOARD_ID.to_string());
    assert_eq!(dashboards.list_permissions(ORG, "42").await.unwrap().len(), 1);
    assert_eq!(dashboards.list_permissions(ORG, "0042").await.unwrap().len(), 1);

    dashboards.revoke(ORG, "+42", &user).await.unwrap();
    assert!(dashboards.list_permissions(ORG, "42").await.unwrap().is_empty());
}

/// Deleting the resource after a grant makes it invisible to listing.
#[tokio::test]
async fn deleted_resource_is_not_found() {
    let (store, services) = stock_services().await;
    let folders = services.folders().unwrap();

    folders
        .set_user_permission(ORG, &FOLDER_ID.to_string(), 7, Some("View"))
        .await
        .unwrap();
    store.delete_dashboard(ORG, FOLDER_ID).await.unwrap();

    let err = folders.list_permissions(ORG, "5").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn map_actions_recovers_level() {
    let (_, services) = stock_services().await;
    let folders = services.folders().unwrap();
    let edit = folders.resolve("Edit").unwrap().clone();
    assert_eq!(folders.map_actions(&edit), Some("Edit"));
    assert_eq!(folders.map_actions(&set(&[FOLDERS_READ])), None);
}
