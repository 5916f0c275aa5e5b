//! The closed set of type shapes a method signature can use.

use std::fmt;

use serde::Serialize;

use super::Parameter;

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChanDir {
    Send,
    Recv,
    Both,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    /// A named type, qualified by the import path of its package.
    Named { package: String, name: String },
    /// A built-in type, or the literal `interface{}` / `struct{}`.
    Predeclared { name: String },
    Pointer { elem: Box<Type> },
    /// Fixed-size array, or a slice when `len` is [`Type::SLICE_LEN`].
    Array { len: i64, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Chan { dir: ChanDir, elem: Box<Type> },
    Func {
        inputs: Vec<Parameter>,
        variadic: Option<Box<Parameter>>,
        outputs: Vec<Parameter>,
    },
    Generic { base: Box<Type>, args: Vec<Type> },
}

impl Type {
    /// Array length marking a slice.
    pub const SLICE_LEN: i64 = -1;

    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Named {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn predeclared(name: impl Into<String>) -> Self {
        Type::Predeclared { name: name.into() }
    }

    pub fn pointer(elem: Type) -> Self {
        Type::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: Type) -> Self {
        Type::Array {
            len: Self::SLICE_LEN,
            elem: Box::new(elem),
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, Type::Array { len, .. } if *len == Self::SLICE_LEN)
    }

    /// Render the type as Go source, asking `qualify` for the prefix of each
    /// package path (return an empty string to leave a name unqualified).
    pub fn render(&self, qualify: &dyn Fn(&str) -> String) -> String {
        match self {
            Type::Named { package, name } => {
                let prefix = if package.is_empty() {
                    String::new()
                } else {
                    qualify(package)
                };
                if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", prefix, name)
                }
            }
            Type::Predeclared { name } => name.clone(),
            Type::Pointer { elem } => format!("*{}", elem.render(qualify)),
            Type::Array { len, elem } if *len == Self::SLICE_LEN => {
                format!("[]{}", elem.render(qualify))
            }
            Type::Array { len, elem } => format!("[{}]{}", len, elem.render(qualify)),
            Type::Map { key, value } => {
                format!("map[{}]{}", key.render(qualify), value.render(qualify))
            }
            Type::Chan { dir, elem } => {
                let elem = elem.render(qualify);
                match dir {
                    ChanDir::Send => format!("chan<- {}", elem),
                    ChanDir::Recv => format!("<-chan {}", elem),
                    ChanDir::Both => format!("chan {}", elem),
                }
            }
            Type::Func {
                inputs,
                variadic,
                outputs,
            } => {
                let mut args: Vec<String> = inputs.iter().map(|p| p.ty.render(qualify)).collect();
                if let Some(v) = variadic {
                    args.push(format!("...{}", v.ty.render(qualify)));
                }
                let rets: Vec<String> = outputs.iter().map(|p| p.ty.render(qualify)).collect();
                match rets.len() {
                    0 => format!("func({})", args.join(", ")),
                    1 => format!("func({}) {}", args.join(", "), rets[0]),
                    _ => format!("func({}) ({})", args.join(", "), rets.join(", ")),
                }
            }
            Type::Generic { base, args } => {
                let args: Vec<String> = args.iter().map(|t| t.render(qualify)).collect();
                format!("{}[{}]", base.render(qualify), args.join(", "))
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&|path: &str| path.to_string()))
    }
}
