//! go.mod parsing.
//!
//! Only the directives that matter for finding package sources are kept:
//! the module path, requirements and replacements.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ResolveError, Result};

/// Where a `replace` directive points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// A directory, relative to the go.mod that declared it.
    Local(PathBuf),
    /// Another module at a version.
    Module { path: String, version: String },
}

/// A parsed go.mod file.
#[derive(Debug, Clone)]
pub struct GoMod {
    /// Module path (e.g., "k8s.io/kubernetes")
    module: String,
    /// Required modules: module path → version
    requires: HashMap<String, String>,
    /// Replace directives: module path → replacement
    replaces: HashMap<String, Replacement>,
}

impl GoMod {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ResolveError::io(path, e))?;
        Self::parse(&content).map_err(|message| ResolveError::Manifest {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse go.mod content.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut module = String::new();
        let mut requires = HashMap::new();
        let mut replaces = HashMap::new();

        let mut in_require_block = false;
        let mut in_replace_block = false;

        for line in content.lines() {
            let line = strip_comment(line);
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix("module ") {
                module = unquote(rest.trim()).to_string();
                continue;
            }

            match line {
                "require (" => {
                    in_require_block = true;
                    continue;
                }
                "replace (" => {
                    in_replace_block = true;
                    continue;
                }
                ")" => {
                    in_require_block = false;
                    in_replace_block = false;
                    continue;
                }
                _ => {}
            }

            if let Some(rest) = line.strip_prefix("require ") {
                if let Some((path, version)) = parse_require_line(rest) {
                    requires.insert(path, version);
                }
                continue;
            }
            if let Some(rest) = line.strip_prefix("replace ") {
                if let Some((from, to)) = parse_replace_line(rest) {
                    replaces.insert(from, to);
                }
                continue;
            }

            if in_require_block {
                if let Some((path, version)) = parse_require_line(line) {
                    requires.insert(path, version);
                }
            } else if in_replace_block {
                if let Some((from, to)) = parse_replace_line(line) {
                    replaces.insert(from, to);
                }
            }
        }

        if module.is_empty() {
            return Err("no module declaration found".to_string());
        }

        Ok(Self {
            module,
            requires,
            replaces,
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Whether `import_path` is this module or one of its packages.
    pub fn contains(&self, import_path: &str) -> bool {
        within(import_path, &self.module)
    }

    /// The requirement with the longest module path covering `import_path`.
    pub fn requirement_for(&self, import_path: &str) -> Option<(&str, &str)> {
        longest_prefix(self.requires.iter(), import_path).map(|(m, v)| (m.as_str(), v.as_str()))
    }

    /// The replacement with the longest module path covering `import_path`.
    pub fn replacement_for(&self, import_path: &str) -> Option<(&str, &Replacement)> {
        longest_prefix(self.replaces.iter(), import_path).map(|(m, r)| (m.as_str(), r))
    }
}

/// `path` equals `module` or lies below it.
pub fn within(path: &str, module: &str) -> bool {
    path == module
        || (path.len() > module.len()
            && path.starts_with(module)
            && path.as_bytes()[module.len()] == b'/')
}

fn longest_prefix<'a, V>(
    entries: impl Iterator<Item = (&'a String, &'a V)>,
    import_path: &str,
) -> Option<(&'a String, &'a V)> {
    entries
        .filter(|(module, _)| within(import_path, module))
        .max_by_key(|(module, _)| module.len())
}

fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or("").trim()
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}

/// Parse a require line: "google.golang.org/grpc v1.78.0"
fn parse_require_line(line: &str) -> Option<(String, String)> {
    let mut parts = line.split_whitespace();
    let path = unquote(parts.next()?).to_string();
    let version = parts.next().unwrap_or("").to_string();
    Some((path, version))
}

/// Parse a replace line: "k8s.io/api v0.1.0 => ./staging/src/k8s.io/api"
fn parse_replace_line(line: &str) -> Option<(String, Replacement)> {
    let (from, to) = line.split_once("=>")?;
    let from = unquote(from.split_whitespace().next()?).to_string();

    let mut target = to.split_whitespace();
    let to_path = unquote(target.next()?);
    let replacement = if is_local_path(to_path) {
        Replacement::Local(PathBuf::from(to_path))
    } else {
        Replacement::Module {
            path: to_path.to_string(),
            version: target.next().unwrap_or("").to_string(),
        }
    };

    Some((from, replacement))
}

fn is_local_path(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../") || path.starts_with('/') || path == "."
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_go_mod() -> &'static str {
        r#"
module k8s.io/kubernetes

go 1.22.0

require (
	github.com/aws/aws-sdk-go v1.50.32
	google.golang.org/grpc v1.78.0
	google.golang.org/grpc/examples v0.0.0-20240101 // indirect
	k8s.io/api v0.0.0
)

require github.com/pkg/errors v0.9.1

replace (
	k8s.io/api => ./staging/src/k8s.io/api
	github.com/old/thing v1.0.0 => github.com/new/thing v1.2.0 // fork
)
"#
    }

    #[test]
    fn test_parse_go_mod() {
        let gomod = GoMod::parse(sample_go_mod()).unwrap();

        assert_eq!(gomod.module(), "k8s.io/kubernetes");
        assert!(gomod.contains("k8s.io/kubernetes/pkg/api"));
        assert!(!gomod.contains("k8s.io/kubernetes-extra"));
        assert_eq!(
            gomod.requirement_for("github.com/pkg/errors"),
            Some(("github.com/pkg/errors", "v0.9.1"))
        );
    }

    #[test]
    fn test_longest_requirement_wins() {
        let gomod = GoMod::parse(sample_go_mod()).unwrap();

        assert_eq!(
            gomod.requirement_for("google.golang.org/grpc/examples/helloworld"),
            Some(("google.golang.org/grpc/examples", "v0.0.0-20240101"))
        );
        assert_eq!(
            gomod.requirement_for("google.golang.org/grpc/credentials"),
            Some(("google.golang.org/grpc", "v1.78.0"))
        );
        assert_eq!(gomod.requirement_for("example.com/fake"), None);
    }

    #[test]
    fn test_replacements() {
        let gomod = GoMod::parse(sample_go_mod()).unwrap();

        assert_eq!(
            gomod.replacement_for("k8s.io/api/core/v1"),
            Some((
                "k8s.io/api",
                &Replacement::Local(PathBuf::from("./staging/src/k8s.io/api"))
            ))
        );
        assert_eq!(
            gomod.replacement_for("github.com/old/thing"),
            Some((
                "github.com/old/thing",
                &Replacement::Module {
                    path: "github.com/new/thing".to_string(),
                    version: "v1.2.0".to_string()
                }
            ))
        );
    }

    #[test]
    fn test_missing_module_declaration() {
        assert!(GoMod::parse("go 1.21\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let temp = TempDir::new().unwrap();
        let go_mod_path = temp.path().join("go.mod");
        fs::write(&go_mod_path, "module \"example.com/quoted\"\n").unwrap();

        let gomod = GoMod::from_file(&go_mod_path).unwrap();
        assert_eq!(gomod.module(), "example.com/quoted");

        fs::write(&go_mod_path, "go 1.21\n").unwrap();
        let err = GoMod::from_file(&go_mod_path).unwrap_err();
        assert!(matches!(err, ResolveError::Manifest { .. }));
    }
}
