//! Build environment: where package sources live on disk.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::gomod::{within, GoMod, Replacement};
use super::{find_module, package_import_path};
use crate::config::GoSettings;
use crate::error::{ResolveError, Result};
use crate::syntax::GoParser;

/// Access to Go package sources.
///
/// The resolver only touches the filesystem through this trait.
pub trait BuildEnv {
    /// Import path of the package in `dir`.
    fn import_path_of_dir(&self, dir: &Path) -> Result<String>;

    /// Directory holding the package `import_path`, as seen from `from_dir`.
    fn find_package_dir(&self, import_path: &str, from_dir: &Path) -> Result<PathBuf>;

    /// Name declared by the package at `import_path`, if it can be found.
    fn package_name(&self, import_path: &str, from_dir: &Path) -> Option<String>;

    /// Buildable `.go` files in `dir`, sorted by name. Test files are skipped.
    fn go_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    fn read_source(&self, path: &Path) -> Result<Vec<u8>>;
}

/// [`BuildEnv`] over the local filesystem, following the go command's
/// lookup rules: the main module, `replace` directives, `vendor/`, the
/// module cache, GOROOT and finally GOPATH.
pub struct GoEnv {
    settings: GoSettings,
    parser: GoParser,
}

impl GoEnv {
    pub fn new(settings: GoSettings) -> Result<Self> {
        Ok(Self {
            settings,
            parser: GoParser::new()?,
        })
    }

    fn find_in_module(&self, import_path: &str, root: &Path, gomod: &GoMod) -> Option<PathBuf> {
        if gomod.contains(import_path) {
            let dir = root.join(relative(import_path, gomod.module()));
            return dir.is_dir().then_some(dir);
        }

        if let Some((module, replacement)) = gomod.replacement_for(import_path) {
            let rel = relative(import_path, module);
            let dir = match replacement {
                Replacement::Local(target) => root.join(target).join(rel),
                Replacement::Module { path, version } => {
                    self.module_cache_dir(path, version)?.join(rel)
                }
            };
            return dir.is_dir().then_some(dir);
        }

        let vendored = root.join("vendor").join(import_path);
        if vendored.is_dir() {
            return Some(vendored);
        }

        let (module, version) = gomod.requirement_for(import_path)?;
        let dir = self
            .module_cache_dir(module, version)?
            .join(relative(import_path, module));
        dir.is_dir().then_some(dir)
    }

    fn module_cache_dir(&self, module: &str, version: &str) -> Option<PathBuf> {
        let cache = self.settings.module_cache()?;
        Some(cache.join(format!("{}@{}", escape_module_path(module), version)))
    }

    fn find_in_goroot(&self, import_path: &str) -> Option<PathBuf> {
        let dir = self.settings.goroot.as_ref()?.join("src").join(import_path);
        dir.is_dir().then_some(dir)
    }

    fn find_in_gopath(&self, import_path: &str) -> Option<PathBuf> {
        self.settings
            .gopath
            .iter()
            .map(|entry| entry.join("src").join(import_path))
            .find(|dir| dir.is_dir())
    }
}

impl BuildEnv for GoEnv {
    fn import_path_of_dir(&self, dir: &Path) -> Result<String> {
        package_import_path(dir, &self.settings)
    }

    fn find_package_dir(&self, import_path: &str, from_dir: &Path) -> Result<PathBuf> {
        if is_standard_library(import_path) {
            if let Some(dir) = self.find_in_goroot(import_path) {
                return Ok(dir);
            }
        }

        if self.settings.module_mode().uses_modules() {
            if let Some((root, gomod)) = find_module(from_dir)? {
                if let Some(dir) = self.find_in_module(import_path, &root, &gomod) {
                    tracing::debug!(import_path, dir = %dir.display(), "found package via go.mod");
                    return Ok(dir);
                }
            }
        }

        if let Some(dir) = self.find_in_gopath(import_path) {
            tracing::debug!(import_path, dir = %dir.display(), "found package in GOPATH");
            return Ok(dir);
        }

        Err(ResolveError::PackageNotFound {
            path: import_path.to_string(),
            dir: from_dir.to_path_buf(),
        })
    }

    fn package_name(&self, import_path: &str, from_dir: &Path) -> Option<String> {
        let dir = self.find_package_dir(import_path, from_dir).ok()?;
        let files = self.go_files(&dir).ok()?;
        files.iter().find_map(|file| {
            let source = self.read_source(file).ok()?;
            self.parser.package_name(&source)
        })
    }

    fn go_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                ResolveError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_buildable_go_file(&name) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read_source(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| ResolveError::io(path, e))
    }
}

/// Standard library paths have no dot in their first element.
fn is_standard_library(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or("");
    !first.contains('.')
}

fn is_buildable_go_file(name: &str) -> bool {
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
}

/// The part of `import_path` below `module`, as a relative filesystem path.
fn relative(import_path: &str, module: &str) -> PathBuf {
    debug_assert!(within(import_path, module));
    import_path[module.len()..]
        .split('/')
        .filter(|part| !part.is_empty())
        .collect()
}

/// Module cache escaping: each uppercase letter becomes `!` plus its lowercase.
fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}
