//! Import tables: local package name to import path.
//!
//! Unnamed imports are named by asking the build environment for the package
//! actually declared at the path, falling back to the last path segment.
//! Two different paths behind one local name are recorded as a duplicate and
//! only fail when that name is used.

use std::collections::HashMap;

use crate::error::{Position, ResolveError, Result};
use crate::syntax::{ImportName, ImportSpec};

/// What a local package name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedPackage {
    Resolved { path: String },
    /// One local name, several import paths.
    Duplicate { name: String, paths: Vec<String> },
}

impl ImportedPackage {
    /// The import path, or an ambiguity error reported at `at`.
    pub fn path_at(&self, at: impl FnOnce() -> Position) -> Result<&str> {
        match self {
            ImportedPackage::Resolved { path } => Ok(path),
            ImportedPackage::Duplicate { name, paths } => Err(ResolveError::AmbiguousImport {
                at: at(),
                name: name.clone(),
                paths: paths.clone(),
            }),
        }
    }
}

/// Imports visible in one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    entries: HashMap<String, ImportedPackage>,
    dot_imports: Vec<String>,
}

impl ImportTable {
    /// Build a table from import specs. `lookup` returns the declared package
    /// name for an import path when the build environment knows it.
    pub fn from_specs<F>(specs: &[ImportSpec], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut table = Self::default();

        for spec in specs {
            let name = match &spec.name {
                Some(ImportName::Blank) => continue,
                Some(ImportName::Dot) => {
                    table.add_dot_import(&spec.path);
                    continue;
                }
                Some(ImportName::Alias(alias)) => alias.clone(),
                None => lookup(&spec.path).unwrap_or_else(|| guess_package_name(&spec.path)),
            };
            table.add(&name, &spec.path);
        }

        table
    }

    pub fn get(&self, name: &str) -> Option<&ImportedPackage> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths imported with `.`, in import order.
    pub fn dot_imports(&self) -> &[String] {
        &self.dot_imports
    }

    pub fn add_dot_import(&mut self, path: &str) {
        if !self.dot_imports.iter().any(|p| p == path) {
            self.dot_imports.push(path.to_string());
        }
    }

    /// Record an import, turning a clash with a different path into a duplicate.
    pub fn add(&mut self, name: &str, path: &str) {
        let merged = match self.entries.remove(name) {
            None => ImportedPackage::Resolved {
                path: path.to_string(),
            },
            Some(ImportedPackage::Resolved { path: existing }) if existing == path => {
                ImportedPackage::Resolved { path: existing }
            }
            Some(ImportedPackage::Resolved { path: existing }) => ImportedPackage::Duplicate {
                name: name.to_string(),
                paths: vec![existing, path.to_string()],
            },
            Some(ImportedPackage::Duplicate { name, mut paths }) => {
                if !paths.iter().any(|p| p == path) {
                    paths.insert(0, path.to_string());
                }
                ImportedPackage::Duplicate { name, paths }
            }
        };
        self.entries.insert(name.to_string(), merged);
    }

    /// Set an explicit import. `.` adds a dot import; anything else replaces
    /// whatever the name pointed to.
    pub fn set(&mut self, name: &str, path: &str) {
        if name == "." {
            self.add_dot_import(path);
            return;
        }
        self.entries.insert(
            name.to_string(),
            ImportedPackage::Resolved {
                path: path.to_string(),
            },
        );
    }

    /// Copy entries from `other` whose names are not already taken.
    pub fn merge_missing(&mut self, other: &ImportTable) {
        for (name, imported) in &other.entries {
            self.entries
                .entry(name.clone())
                .or_insert_with(|| imported.clone());
        }
    }
}

/// Heuristic package name: the last path segment up to its first dot.
///
/// `gopkg.in/yaml.v3` guesses `yaml`. The real package name can differ.
pub fn guess_package_name(path: &str) -> String {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.split('.').next().unwrap_or(last).to_string()
}
