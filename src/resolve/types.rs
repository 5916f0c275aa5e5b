//! Type expression and parameter list translation.

use crate::error::{Position, ResolveError, Result};
use crate::imports::ImportTable;
use crate::model::{ChanDir, Parameter, Type};
use crate::syntax::{self, Field, Pos, Signature, TypeExpr, TypeExprKind};

/// A translated signature: inputs, the variadic slot, outputs.
pub type Translated = (Vec<Parameter>, Option<Parameter>, Vec<Parameter>);

/// Translates syntax type expressions into model types.
///
/// `package` arguments are the package context a declaration was found in:
/// an import path, or the short name an auxiliary file was registered under.
/// Unqualified exported names are placed in that package.
pub struct TypeTranslator<'a> {
    imports: &'a ImportTable,
    /// File the translated syntax came from, for error positions.
    file: &'a str,
}

impl<'a> TypeTranslator<'a> {
    pub fn new(imports: &'a ImportTable, file: &'a str) -> Self {
        Self { imports, file }
    }

    fn at(&self, pos: Pos) -> Position {
        Position::new(self.file, pos)
    }

    pub fn translate(&self, package: &str, ty: &TypeExpr) -> Result<Type> {
        match &ty.kind {
            TypeExprKind::Generic { base, args } => Ok(Type::Generic {
                base: Box::new(self.translate(package, base)?),
                args: args
                    .iter()
                    .map(|arg| self.translate(package, arg))
                    .collect::<Result<_>>()?,
            }),
            TypeExprKind::Array { len, elem } => {
                let len = match len {
                    None => Type::SLICE_LEN,
                    Some(len) => parse_array_len(&len.text)
                        .filter(|_| len.literal)
                        .ok_or_else(|| ResolveError::BadArraySize {
                            at: self.at(len.pos),
                            len: len.text.clone(),
                        })?,
                };
                Ok(Type::Array {
                    len,
                    elem: Box::new(self.translate(package, elem)?),
                })
            }
            TypeExprKind::Chan { dir, elem } => Ok(Type::Chan {
                dir: match dir {
                    syntax::ChanDir::Send => ChanDir::Send,
                    syntax::ChanDir::Recv => ChanDir::Recv,
                    syntax::ChanDir::Both => ChanDir::Both,
                },
                elem: Box::new(self.translate(package, elem)?),
            }),
            // Only valid as the last parameter; the caller has split it off.
            TypeExprKind::Ellipsis(elem) => self.translate(package, elem),
            TypeExprKind::Func(signature) => {
                let (inputs, variadic, outputs) = self.signature(package, signature)?;
                Ok(Type::Func {
                    inputs,
                    variadic: variadic.map(Box::new),
                    outputs,
                })
            }
            TypeExprKind::Ident(name) if syntax::is_exported(name) => {
                // The context may be an import alias; name the package by its path.
                let package = match self.imports.get(package) {
                    Some(imported) => imported.path_at(|| self.at(ty.pos))?,
                    None => package,
                };
                Ok(Type::named(package, name.as_str()))
            }
            TypeExprKind::Ident(name) => Ok(Type::predeclared(name.as_str())),
            TypeExprKind::Interface(elems) if elems.is_empty() => {
                Ok(Type::predeclared("interface{}"))
            }
            TypeExprKind::Interface(_) => Err(ResolveError::NonEmptyAnonymous {
                at: self.at(ty.pos),
                what: "interface",
            }),
            TypeExprKind::Struct { fields: 0 } => Ok(Type::predeclared("struct{}")),
            TypeExprKind::Struct { .. } => Err(ResolveError::NonEmptyAnonymous {
                at: self.at(ty.pos),
                what: "struct",
            }),
            TypeExprKind::Map { key, value } => Ok(Type::Map {
                key: Box::new(self.translate(package, key)?),
                value: Box::new(self.translate(package, value)?),
            }),
            TypeExprKind::Qualified { package: alias, name } => {
                let imported =
                    self.imports
                        .get(&alias.name)
                        .ok_or_else(|| ResolveError::UnknownPackage {
                            at: self.at(ty.pos),
                            name: alias.name.clone(),
                        })?;
                let path = imported.path_at(|| self.at(ty.pos))?;
                Ok(Type::named(path, name.as_str()))
            }
            TypeExprKind::Pointer(elem) => Ok(Type::pointer(self.translate(package, elem)?)),
            TypeExprKind::Paren(inner) => self.translate(package, inner),
            TypeExprKind::Union(_) | TypeExprKind::Negated(_) | TypeExprKind::Other(_) => {
                Err(ResolveError::UnknownTypeShape {
                    at: self.at(ty.pos),
                    shape: ty.shape(),
                })
            }
        }
    }

    /// Expand field groups into one parameter per name.
    pub fn parameters(&self, package: &str, fields: &[Field]) -> Result<Vec<Parameter>> {
        let mut params = Vec::with_capacity(fields.len());
        for field in fields {
            let ty = self.translate(package, &field.ty)?;
            if field.names.is_empty() {
                params.push(Parameter::anonymous(ty));
                continue;
            }
            for name in &field.names {
                params.push(Parameter::new(name.name.as_str(), ty.clone()));
            }
        }
        Ok(params)
    }

    /// Translate a signature, splitting a trailing `...T` group into the
    /// variadic slot.
    pub fn signature(&self, package: &str, signature: &Signature) -> Result<Translated> {
        let (regular, variadic) = match signature.params.split_last() {
            Some((last, rest)) if signature.is_variadic() => (rest, Some(last)),
            _ => (signature.params.as_slice(), None),
        };

        let variadic = match variadic {
            Some(group) => self
                .parameters(package, std::slice::from_ref(group))?
                .into_iter()
                .next(),
            None => None,
        };
        let inputs = self.parameters(package, regular)?;
        let outputs = self.parameters(package, &signature.results)?;

        Ok((inputs, variadic, outputs))
    }
}

/// A non-negative decimal array length.
fn parse_array_len(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
