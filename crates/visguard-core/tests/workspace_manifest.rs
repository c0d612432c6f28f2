//! Workspace manifest checks.
//!
//! Panicking units of work are recorded as failed outcomes by unwinding, so
//! no profile may switch panics to abort.

use std::path::Path;

fn workspace_manifest() -> toml::Value {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap();
    let root_toml = std::fs::read_to_string(root.join("Cargo.toml")).unwrap();
    root_toml.parse().unwrap()
}

#[test]
fn no_profile_aborts_on_panic() {
    let doc = workspace_manifest();
    let Some(profiles) = doc.get("profile").and_then(|p| p.as_table()) else {
        return;
    };

    for (name, profile) in profiles {
        let strategy = profile.get("panic").and_then(|v| v.as_str());
        assert_ne!(
            strategy,
            Some("abort"),
            "profile.{} must unwind so a panicking project is reported, not fatal",
            name
        );
    }
}

#[test]
fn all_crates_use_workspace_version() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap();

    for krate in [
        "crates/visguard-core",
        "crates/visguard-gitlab",
        "crates/visguard-cli",
    ] {
        let toml_str = std::fs::read_to_string(root.join(krate).join("Cargo.toml")).unwrap();
        let doc: toml::Value = toml_str.parse().unwrap();
        let inherits = doc["package"]["version"]
            .as_table()
            .and_then(|t| t.get("workspace"))
            .and_then(|v| v.as_bool());
        assert_eq!(inherits, Some(true), "{} must use version.workspace", krate);
    }
}
