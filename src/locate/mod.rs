//! Module and workspace location.
//!
//! Maps a directory to the import path of the package it holds, either from
//! the enclosing go.mod or from a GOPATH `src` tree.

mod env;
mod gomod;

pub use env::{BuildEnv, GoEnv};
pub use gomod::{GoMod, Replacement};

use std::path::{Path, PathBuf};

use crate::config::GoSettings;
use crate::error::{ResolveError, Result};

/// Walk up from `dir` to the nearest go.mod, returning its directory and contents.
pub fn find_module(dir: &Path) -> Result<Option<(PathBuf, GoMod)>> {
    for candidate in dir.ancestors() {
        let manifest = candidate.join("go.mod");
        match std::fs::metadata(&manifest) {
            Ok(meta) if meta.is_file() => {
                let gomod = GoMod::from_file(&manifest)?;
                return Ok(Some((candidate.to_path_buf(), gomod)));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ResolveError::io(&manifest, e)),
        }
    }
    Ok(None)
}

/// The import path of the package in `dir`.
pub fn package_import_path(dir: &Path, go: &GoSettings) -> Result<String> {
    if go.module_mode().uses_modules() {
        if let Some((root, gomod)) = find_module(dir)? {
            let import_path = join_import_path(gomod.module(), dir.strip_prefix(&root).ok());
            tracing::debug!(dir = %dir.display(), module = gomod.module(), %import_path, "located package in module");
            return Ok(import_path);
        }
    }

    if go.gopath.is_empty() {
        return Err(ResolveError::GopathNotSet);
    }
    for entry in &go.gopath {
        if let Ok(rel) = dir.strip_prefix(entry.join("src")) {
            if rel.as_os_str().is_empty() {
                continue;
            }
            let import_path = join_import_path("", Some(rel));
            tracing::debug!(dir = %dir.display(), gopath = %entry.display(), %import_path, "located package in GOPATH");
            return Ok(import_path);
        }
    }

    Err(ResolveError::OutsideWorkspace(dir.to_path_buf()))
}

/// Like [`package_import_path`], but `dir` must contain a `.go` file.
pub fn package_import_of_dir(dir: &Path, go: &GoSettings) -> Result<String> {
    let entries = std::fs::read_dir(dir).map_err(|e| ResolveError::io(dir, e))?;
    let has_go_file = entries.filter_map(|e| e.ok()).any(|entry| {
        entry.file_type().map(|t| !t.is_dir()).unwrap_or(false)
            && entry.file_name().to_string_lossy().ends_with(".go")
    });
    if !has_go_file {
        return Err(ResolveError::NoSourceFile(dir.to_path_buf()));
    }
    package_import_path(dir, go)
}

/// `base` followed by the slash-separated components of `rel`.
fn join_import_path(base: &str, rel: Option<&Path>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !base.is_empty() {
        parts.push(base.to_string());
    }
    if let Some(rel) = rel {
        parts.extend(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().to_string()),
        );
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleMode;
    use std::fs;
    use tempfile::TempDir;

    fn settings(gopath: Vec<PathBuf>) -> GoSettings {
        GoSettings {
            gopath,
            ..GoSettings::default()
        }
    }

    #[test]
    fn test_module_path_with_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.com/app\n").unwrap();
        let dir = temp.path().join("internal/store");
        fs::create_dir_all(&dir).unwrap();

        let go = settings(vec![]);
        assert_eq!(
            package_import_path(&dir, &go).unwrap(),
            "example.com/app/internal/store"
        );
        assert_eq!(package_import_path(temp.path(), &go).unwrap(), "example.com/app");
    }

    #[test]
    fn test_unreadable_manifest_location_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.com/app\n").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        // Statting notes.txt/go.mod fails with something other than NotFound.
        let dir = temp.path().join("notes.txt/sub");
        let err = find_module(&dir).unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }), "got {:?}", err);
    }

    #[test]
    fn test_gopath_fallback() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src/github.com/acme/tool");
        fs::create_dir_all(&dir).unwrap();

        let go = GoSettings {
            module_mode: Some(ModuleMode::Off),
            ..settings(vec![PathBuf::from("/nonexistent"), temp.path().to_path_buf()])
        };
        assert_eq!(package_import_path(&dir, &go).unwrap(), "github.com/acme/tool");
    }

    #[test]
    fn test_module_mode_off_ignores_go_mod() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.com/app\n").unwrap();

        let go = GoSettings {
            module_mode: Some(ModuleMode::Off),
            ..settings(vec![])
        };
        assert!(matches!(
            package_import_path(temp.path(), &go),
            Err(ResolveError::GopathNotSet)
        ));
    }

    #[test]
    fn test_outside_workspace() {
        let temp = TempDir::new().unwrap();
        let go = GoSettings {
            module_mode: Some(ModuleMode::Off),
            ..settings(vec![PathBuf::from("/nonexistent")])
        };
        let err = package_import_path(temp.path(), &go).unwrap_err();
        assert!(matches!(err, ResolveError::OutsideWorkspace(_)));
        assert!(err.to_string().contains("outside any module or GOPATH"));
    }

    #[test]
    fn test_package_import_of_dir_requires_go_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.com/app\n").unwrap();
        let go = settings(vec![]);

        assert!(matches!(
            package_import_of_dir(temp.path(), &go),
            Err(ResolveError::NoSourceFile(_))
        ));

        fs::write(temp.path().join("main.go"), "package main\n").unwrap();
        assert_eq!(package_import_of_dir(temp.path(), &go).unwrap(), "example.com/app");
    }
}
