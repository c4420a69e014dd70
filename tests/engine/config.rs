//! Building services from configuration files.

use std::io::Write;

use resperm::{ConfigLoader, Error, Principal};

use super::{ORG, seeded_store};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{content}").unwrap();
    file
}

const KINDS: &str = r#"
actions = [
    "dashboards:read", "dashboards:write",
    "folders:read", "folders:write",
    "reports:read", "reports:write",
]

[[kinds]]
name = "dashboards"
validator = "dashboard"
reader_role = "Dashboard reader"
writer_role = "Dashboard writer"
role_group = "Dashboards"
levels = [
    { name = "View", actions = ["dashboards:read"] },
    { name = "Edit", actions = ["dashboards:write"] },
]

[[kinds]]
name = "folders"
validator = "folder"
include = ["dashboards"]
reader_role = "Folder reader"
writer_role = "Folder writer"
role_group = "Folders"
levels = [
    { name = "View", actions = ["folders:read"] },
    { name = "Edit", actions = ["folders:write"] },
]

[[kinds]]
name = "reports"
reader_role = "Report reader"
writer_role = "Report writer"
role_group = "Reports"
assignments = { teams = false }
levels = [
    { name = "View", actions = ["reports:read"] },
    { name = "Edit", actions = ["reports:write"] },
]
"#;

#[tokio::test]
async fn configured_kinds_are_registered() {
    let file = write_config(KINDS);
    let config = ConfigLoader::new("ENGINECFG")
        .load(Some(file.path()), Some(":memory:"))
        .unwrap();
    let store = seeded_store().await;
    let services = config
        .build_services(store.clone(), store.clone(), store.clone())
        .unwrap();

    assert_eq!(services.kinds(), ["dashboards", "folders", "reports"]);

    let folders = services.folders().unwrap();
    let grant = folders
        .set_user_permission(ORG, "5", 7, Some("Edit"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(grant.actions.len(), 4);
    assert!(grant.actions.contains("dashboards:write"));

    let reports = services.get("reports").unwrap();
    let err = reports
        .set_permission(ORG, "q3-revenue", &Principal::Team(3), Some("View"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));
    reports
        .set_permission(ORG, "q3-revenue", &Principal::User(7), Some("View"))
        .await
        .unwrap();

    services.provision_all().await.unwrap();
}

#[tokio::test]
async fn empty_config_yields_stock_kinds() {
    let config = ConfigLoader::new("ENGINEDEFAULT")
        .load(None, Some(":memory:"))
        .unwrap();
    let store = seeded_store().await;
    let services = config
        .build_services(store.clone(), store.clone(), store)
        .unwrap();
    assert_eq!(services.kinds(), ["dashboards", "folders"]);
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let file = write_config(
        r#"
actions = ["reports:read"]

[[kinds]]
name = "reports"
reader_role = "Report reader"
writer_role = "Report writer"
role_group = "Reports"
levels = [{ name = "View", actions = ["reports:read", "reports:delete"] }]
"#,
    );
    let config = ConfigLoader::new("ENGINEVOCAB")
        .load(Some(file.path()), Some(":memory:"))
        .unwrap();
    let store = seeded_store().await;
    let err = config
        .build_services(store.clone(), store.clone(), store)
        .unwrap_err();
    assert!(err.to_string().contains("reports:delete"), "{err}");
}

#[tokio::test]
async fn duplicate_kind_is_rejected() {
    let file = write_config(
        r#"
[[kinds]]
name = "reports"
reader_role = "a"
writer_role = "b"
role_group = "Reports"
levels = [{ name = "View", actions = ["reports:read"] }]

[[kinds]]
name = "reports"
reader_role = "c"
writer_role = "d"
role_group = "Reports"
levels = [{ name = "View", actions = ["reports:read"] }]
"#,
    );
    let config = ConfigLoader::new("ENGINEDUP")
        .load(Some(file.path()), Some(":memory:"))
        .unwrap();
    let store = seeded_store().await;
    let err = config
        .build_services(store.clone(), store.clone(), store)
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateKind(kind) if kind == "reports"));
}

#[tokio::test]
async fn non_monotonic_levels_need_opt_out() {
    let levels = r#"
[[kinds]]
name = "alerts"
reader_role = "Alert reader"
writer_role = "Alert writer"
role_group = "Alerts"
cascade = false
MONOTONIC
levels = [
    { name = "View", actions = ["alerts:read"] },
    { name = "Silence", actions = ["alerts:silence"] },
]
"#;
    let store = seeded_store().await;

    let strict = write_config(&levels.replace("MONOTONIC", ""));
    let config = ConfigLoader::new("ENGINEMONO")
        .load(Some(strict.path()), Some(":memory:"))
        .unwrap();
    let err = config
        .build_services(store.clone(), store.clone(), store.clone())
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let loose = write_config(&levels.replace("MONOTONIC", "monotonic = false"));
    let config = ConfigLoader::new("ENGINEMONO")
        .load(Some(loose.path()), Some(":memory:"))
        .unwrap();
    let services = config
        .build_services(store.clone(), store.clone(), store)
        .unwrap();
    let alerts = services.get("alerts").unwrap();
    let silence = alerts.resolve("Silence").unwrap();
    assert_eq!(silence.len(), 1);
    assert!(silence.contains("alerts:silence"));
}
