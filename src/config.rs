//! Configuration for a resolve run.
//!
//! Values come from the process environment (`GOPATH`, `GOROOT`,
//! `GOMODCACHE`, `GO111MODULE`) and an optional `implgen.yaml`:
//!
//! ```yaml
//! imports:
//!   - name: log
//!     path: github.com/sirupsen/logrus
//! aux_files:
//!   - package: base
//!     file: ../base/base.go
//! go:
//!   module_mode: on
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::resolve::ResolverConfig;

/// Config file names searched for, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["implgen.yaml", ".implgen.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub go: GoSettings,
    /// Explicit imports that win over the entry file's own.
    #[serde(default)]
    pub imports: Vec<ImportOverride>,
    /// Extra files whose declarations can be embedded.
    #[serde(default)]
    pub aux_files: Vec<AuxFile>,
}

/// `name` may be `.` for a dot import.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportOverride {
    pub name: String,
    pub path: String,
}

/// An auxiliary file and the package name embeds refer to it by.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuxFile {
    pub package: String,
    pub file: PathBuf,
}

/// `GO111MODULE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleMode {
    On,
    Off,
    #[default]
    Auto,
}

impl ModuleMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "on" => Some(ModuleMode::On),
            "off" => Some(ModuleMode::Off),
            "auto" | "" => Some(ModuleMode::Auto),
            _ => None,
        }
    }

    /// Whether go.mod files are consulted at all.
    pub fn uses_modules(&self) -> bool {
        !matches!(self, ModuleMode::Off)
    }
}

/// Go toolchain locations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GoSettings {
    #[serde(default)]
    pub module_mode: Option<ModuleMode>,
    #[serde(default)]
    pub gopath: Vec<PathBuf>,
    #[serde(default)]
    pub goroot: Option<PathBuf>,
    #[serde(default)]
    pub gomodcache: Option<PathBuf>,
}

impl GoSettings {
    pub fn module_mode(&self) -> ModuleMode {
        self.module_mode.unwrap_or_default()
    }

    /// The module download cache: `GOMODCACHE`, else `$GOPATH[0]/pkg/mod`.
    pub fn module_cache(&self) -> Option<PathBuf> {
        self.gomodcache
            .clone()
            .or_else(|| self.gopath.first().map(|p| p.join("pkg").join("mod")))
    }

    /// Replace every field `other` sets.
    pub fn overlay(&mut self, other: GoSettings) {
        if other.module_mode.is_some() {
            self.module_mode = other.module_mode;
        }
        if !other.gopath.is_empty() {
            self.gopath = other.gopath;
        }
        if other.goroot.is_some() {
            self.goroot = other.goroot;
        }
        if other.gomodcache.is_some() {
            self.gomodcache = other.gomodcache;
        }
    }

    fn from_env() -> Self {
        let module_mode = env::var("GO111MODULE").ok().and_then(|v| {
            let mode = ModuleMode::parse(&v);
            if mode.is_none() {
                tracing::warn!(value = %v, "ignoring invalid GO111MODULE");
            }
            mode
        });

        let gopath = match env::var_os("GOPATH") {
            Some(value) if !value.is_empty() => env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            _ => default_gopath().into_iter().collect(),
        };

        Self {
            module_mode,
            gopath,
            goroot: non_empty_path("GOROOT"),
            gomodcache: non_empty_path("GOMODCACHE"),
        }
    }
}

/// `$HOME/go`, Go's own default.
fn default_gopath() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join("go"))
}

fn non_empty_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl Config {
    /// Configuration from environment variables only.
    pub fn from_env() -> Self {
        Self {
            go: GoSettings::from_env(),
            ..Self::default()
        }
    }

    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        // Aux file paths are relative to the config file.
        if let Some(base) = path.parent() {
            for aux in &mut config.aux_files {
                if aux.file.is_relative() {
                    aux.file = base.join(&aux.file);
                }
            }
        }
        Ok(config)
    }

    /// Fold a file config into this one. File values win for Go settings;
    /// imports and aux files are appended.
    pub fn merge(&mut self, file: Config) {
        self.go.overlay(file.go);
        self.imports.extend(file.imports);
        self.aux_files.extend(file.aux_files);
    }

    /// Add `-imports`-style overrides: `name=path,name=path`.
    pub fn add_imports_flag(&mut self, flag: &str) -> anyhow::Result<()> {
        self.imports.extend(parse_imports_flag(flag)?);
        Ok(())
    }

    /// Add `-aux_files`-style entries: `package=file,package=file`.
    pub fn add_aux_files_flag(&mut self, flag: &str) -> anyhow::Result<()> {
        self.aux_files.extend(parse_aux_files_flag(flag)?);
        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            imports: self
                .imports
                .iter()
                .map(|i| (i.name.clone(), i.path.clone()))
                .collect(),
            aux_files: self
                .aux_files
                .iter()
                .map(|a| (a.package.clone(), a.file.clone()))
                .collect(),
            lookup_package_names: true,
        }
    }
}

/// Look for a config file in `start` and its parents.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

pub fn parse_imports_flag(flag: &str) -> anyhow::Result<Vec<ImportOverride>> {
    split_pairs(flag)
        .map(|kv| match kv.split_once('=') {
            Some((name, path)) => Ok(ImportOverride {
                name: name.to_string(),
                path: path.to_string(),
            }),
            None => bail!("bad import spec: {}", kv),
        })
        .collect()
}

pub fn parse_aux_files_flag(flag: &str) -> anyhow::Result<Vec<AuxFile>> {
    split_pairs(flag)
        .map(|kv| match kv.split_once('=') {
            Some((package, file)) => Ok(AuxFile {
                package: package.to_string(),
                file: PathBuf::from(file),
            }),
            None => bail!("bad aux file spec: {}", kv),
        })
        .collect()
}

fn split_pairs(flag: &str) -> impl Iterator<Item = &str> {
    flag.split(',').map(str::trim).filter(|kv| !kv.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_imports_flag() {
        let imports = parse_imports_flag("log=github.com/sirupsen/logrus,.=example.com/dsl").unwrap();
        assert_eq!(
            imports,
            vec![
                ImportOverride {
                    name: "log".to_string(),
                    path: "github.com/sirupsen/logrus".to_string()
                },
                ImportOverride {
                    name: ".".to_string(),
                    path: "example.com/dsl".to_string()
                },
            ]
        );
        assert!(parse_imports_flag("").unwrap().is_empty());
        assert!(parse_imports_flag("nope").is_err());
    }

    #[test]
    fn test_parse_aux_files_flag() {
        let aux = parse_aux_files_flag(" base=a/b.go , other=c.go").unwrap();
        assert_eq!(aux.len(), 2);
        assert_eq!(aux[0].package, "base");
        assert_eq!(aux[0].file, PathBuf::from("a/b.go"));

        let err = parse_aux_files_flag("base").unwrap_err();
        assert_eq!(err.to_string(), "bad aux file spec: base");
    }

    #[test]
    fn test_parse_file_and_merge() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("implgen.yaml");
        fs::write(
            &path,
            r#"
imports:
  - name: log
    path: github.com/sirupsen/logrus
aux_files:
  - package: base
    file: base/base.go
go:
  module_mode: "off"
  gopath: [/opt/go]
"#,
        )
        .unwrap();

        let file = Config::parse_file(&path).unwrap();
        assert_eq!(file.aux_files[0].file, temp.path().join("base/base.go"));

        let mut config = Config {
            go: GoSettings {
                module_mode: Some(ModuleMode::On),
                gopath: vec![PathBuf::from("/home/me/go")],
                goroot: Some(PathBuf::from("/usr/local/go")),
                gomodcache: None,
            },
            ..Config::default()
        };
        config.merge(file);

        assert_eq!(config.go.module_mode(), ModuleMode::Off);
        assert_eq!(config.go.gopath, vec![PathBuf::from("/opt/go")]);
        assert_eq!(config.go.goroot, Some(PathBuf::from("/usr/local/go")));
        assert_eq!(
            config.go.module_cache(),
            Some(PathBuf::from("/opt/go/pkg/mod"))
        );
        assert_eq!(config.imports.len(), 1);

        let resolver = config.resolver_config();
        assert_eq!(
            resolver.imports,
            vec![("log".to_string(), "github.com/sirupsen/logrus".to_string())]
        );
    }

    #[test]
    fn test_discover_walks_parents() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(discover(&nested), None);

        fs::write(temp.path().join(".implgen.yaml"), "{}\n").unwrap();
        assert_eq!(discover(&nested), Some(temp.path().join(".implgen.yaml")));
    }
}
