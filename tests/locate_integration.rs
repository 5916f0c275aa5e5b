//! Integration tests for import path location and package lookup.

use std::fs;
use std::path::{Path, PathBuf};

use implgen::config::{GoSettings, ModuleMode};
use implgen::locate::{self, BuildEnv, GoEnv};
use implgen::{ErrorKind, ResolveError};
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_fixture_module_paths() {
    let shop = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/shop");
    let go = GoSettings::default();

    assert_eq!(
        locate::package_import_of_dir(&shop.join("store"), &go).unwrap(),
        "example.com/shop/store"
    );
    // The module root holds no Go files.
    let err = locate::package_import_of_dir(&shop, &go).unwrap_err();
    assert!(matches!(err, ResolveError::NoSourceFile(_)));
    assert_eq!(err.kind(), ErrorKind::Location);

    let (root, gomod) = locate::find_module(&shop.join("base")).unwrap().unwrap();
    assert_eq!(root, shop);
    assert_eq!(gomod.module(), "example.com/shop");
    assert_eq!(
        gomod.requirement_for("github.com/google/uuid"),
        Some(("github.com/google/uuid", "v1.6.0"))
    );
}

#[test]
fn test_nested_modules_use_nearest_go_mod() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("go.mod"), "module example.com/outer\n");
    write(&temp.path().join("tools/go.mod"), "module example.com/tools\n");
    let dir = temp.path().join("tools/cmd/gen");
    write(&dir.join("main.go"), "package main\n");

    let go = GoSettings::default();
    assert_eq!(
        locate::package_import_of_dir(&dir, &go).unwrap(),
        "example.com/tools/cmd/gen"
    );
}

#[test]
fn test_module_cache_lookup_with_replaced_version() {
    let temp = TempDir::new().unwrap();
    let app = temp.path().join("app");
    let cache = temp.path().join("gopath/pkg/mod");
    write(
        &app.join("go.mod"),
        "module example.com/app\n\nrequire github.com/Shopify/sarama v1.30.0\n\nreplace github.com/Shopify/sarama => github.com/IBM/sarama v1.43.0\n",
    );
    write(
        &cache.join("github.com/!i!b!m/sarama@v1.43.0/mocks/mocks.go"),
        "package mocks\n",
    );

    let env = GoEnv::new(GoSettings {
        module_mode: Some(ModuleMode::On),
        gopath: vec![temp.path().join("gopath")],
        ..GoSettings::default()
    })
    .unwrap();

    let dir = env
        .find_package_dir("github.com/Shopify/sarama/mocks", &app)
        .unwrap();
    assert_eq!(dir, cache.join("github.com/!i!b!m/sarama@v1.43.0/mocks"));
    assert_eq!(
        env.package_name("github.com/Shopify/sarama/mocks", &app),
        Some("mocks".to_string())
    );
}
