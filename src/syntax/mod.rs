//! Go syntax front end.
//!
//! Source is parsed with tree-sitter and lowered into an owned model
//! ([`SourceFile`]) so declarations can be cached and shared across files and
//! packages without holding on to parse trees.

mod ast;
mod comments;
mod lower;

pub use ast::{
    is_exported, ArrayLen, ChanDir, Decl, Field, FuncDecl, Ident, ImportName, ImportSpec,
    InterfaceElem, MethodSpec, Pos, Receiver, Signature, SourceFile, TypeDecl, TypeExpr,
    TypeExprKind, TypeSpec,
};
pub use lower::GoParser;
