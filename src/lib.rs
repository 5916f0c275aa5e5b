//! implgen - model builder for Go interface implementations.
//!
//! Given a Go source file, implgen extracts every interface and struct it
//! declares and produces a fully resolved, language-agnostic model of their
//! method signatures. Embedded interfaces are followed into auxiliary files
//! and other packages, which are located and parsed on demand.
//!
//! # Architecture
//!
//! - `syntax`: tree-sitter front end lowering Go source to an owned syntax model
//! - `scan`: interface and struct declarations of a file
//! - `imports`: local package names to import paths
//! - `locate`: go.mod, GOPATH and package directory lookup
//! - `resolve`: the resolver and the type translator
//! - `model`: the output model
//! - `alloc`: collision-free identifiers for generated code
//! - `config`, `report`, `cli`: the command-line front end

pub mod alloc;
pub mod cli;
pub mod config;
pub mod error;
pub mod imports;
pub mod locate;
pub mod model;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod syntax;

use std::path::Path;

pub use alloc::IdentifierAllocator;
pub use config::Config;
pub use error::{ErrorKind, Position, ResolveError, Result};
pub use imports::{ImportTable, ImportedPackage};
pub use locate::{BuildEnv, GoEnv};
pub use model::{ChanDir, Interface, Method, Package, Parameter, Struct, Type};
pub use resolve::{Resolver, ResolverConfig};

/// Resolve `source` against the filesystem with the given configuration.
pub fn source_mode(source: &Path, config: &Config) -> Result<Package> {
    let env = GoEnv::new(config.go.clone())?;
    let resolver = Resolver::new(&env, config.resolver_config())?;
    resolver.resolve(source)
}
