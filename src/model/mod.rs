//! Language-agnostic model of resolved interfaces and structs.
//!
//! Everything here is built once, bottom-up (types, parameters, methods,
//! interfaces and structs, package) and handed to the caller read-only.

mod types;

pub use types::{ChanDir, Type};

use std::collections::BTreeMap;

use serde::Serialize;

/// A resolved source package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    /// Package name from the `package` clause.
    pub name: String,
    /// Fully qualified import path.
    pub path: String,
    pub interfaces: Vec<Interface>,
    pub structs: Vec<Struct>,
    /// Paths imported with `import . "path"`.
    pub dot_imports: Vec<String>,
}

impl Package {
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn structure(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }
}

/// An interface with its own and embedded methods, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub name: String,
    pub doc: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub methods: Vec<Method>,
}

/// A struct and the methods already declared on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Struct {
    pub name: String,
    pub doc: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub methods: BTreeMap<String, Method>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    pub name: String,
    pub doc: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub inputs: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variadic: Option<Parameter>,
    pub outputs: Vec<Parameter>,
}

impl Method {
    /// A method with no parameters or results.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: Vec::new(),
            comment: None,
            inputs: Vec::new(),
            variadic: None,
            outputs: Vec::new(),
        }
    }
}

/// A parameter or result. Anonymous when `name` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    pub fn anonymous(ty: Type) -> Self {
        Self { name: None, ty }
    }
}
