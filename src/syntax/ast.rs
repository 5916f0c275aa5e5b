//! Owned Go syntax model lowered from the tree-sitter tree.
//!
//! Only the parts of a file the model builder needs are kept: the package
//! clause, imports, type declarations and function declarations. Type
//! expressions keep their full shape so the translator can reject what the
//! model cannot express.

use std::fmt;

/// Source position (1-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    /// Create a position from the start of a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        Self {
            line: start.row + 1, // tree-sitter is 0-indexed
            column: start.column + 1,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An identifier with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().map(char::is_uppercase).unwrap_or(false)
}

/// A parsed Go source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// The file path (for error reporting).
    pub path: String,
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

/// The local name given to an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import . "path"`
    Dot,
    /// `import _ "path"`
    Blank,
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: Option<ImportName>,
    /// Import path with quotes removed.
    pub path: String,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
}

/// A `type` declaration, possibly grouped.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub doc: Vec<String>,
    pub specs: Vec<TypeSpec>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    /// Doc comment attached to the spec itself (grouped declarations only).
    pub doc: Vec<String>,
    /// Trailing comment on the spec's last line.
    pub comment: Option<String>,
    pub ty: TypeExpr,
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: Ident,
    pub doc: Vec<String>,
    /// Trailing comment after the closing brace.
    pub comment: Option<String>,
    pub receiver: Option<Receiver>,
    pub signature: Signature,
}

/// A method receiver, reduced to the receiver's base type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    /// `None` when the receiver type is not a (possibly generic) type name.
    pub base: Option<String>,
}

/// Parameters and results of a function type.
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub pos: Pos,
}

impl Signature {
    /// Reports whether the last parameter group is `...T`.
    pub fn is_variadic(&self) -> bool {
        matches!(
            self.params.last().map(|f| &f.ty.kind),
            Some(TypeExprKind::Ellipsis(_))
        )
    }
}

/// A field group: zero or more names sharing one type.
#[derive(Debug, Clone)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub pos: Pos,
}

/// An element of an interface body.
#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method(MethodSpec),
    /// Anything that is not a method signature: embedded interfaces,
    /// instantiated generics, unions and approximation constraints.
    Embed(TypeExpr),
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub name: Ident,
    pub doc: Vec<String>,
    pub comment: Option<String>,
    pub signature: Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
    Both,
}

/// Array length as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLen {
    pub text: String,
    /// Whether the length is an integer literal (as opposed to a constant
    /// expression or `...`).
    pub literal: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// Unqualified type name: `int`, `Foo`
    Ident(String),
    /// `pkg.Name`
    Qualified { package: Ident, name: String },
    Pointer(Box<TypeExpr>),
    Paren(Box<TypeExpr>),
    /// Arrays carry a length, slices do not.
    Array {
        len: Option<ArrayLen>,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    /// `...T` in a parameter list.
    Ellipsis(Box<TypeExpr>),
    Func(Signature),
    Interface(Vec<InterfaceElem>),
    Struct { fields: usize },
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// `A | B` in a constraint.
    Union(Vec<TypeExpr>),
    /// `~T` in a constraint.
    Negated(Box<TypeExpr>),
    /// Any other node, by tree-sitter kind.
    Other(String),
}

impl TypeExpr {
    /// A short description of the expression's shape for error messages.
    pub fn shape(&self) -> String {
        match &self.kind {
            TypeExprKind::Ident(name) => name.clone(),
            TypeExprKind::Qualified { package, name } => format!("{}.{}", package.name, name),
            TypeExprKind::Pointer(_) => "pointer type".to_string(),
            TypeExprKind::Paren(_) => "parenthesized type".to_string(),
            TypeExprKind::Array { len: None, .. } => "slice type".to_string(),
            TypeExprKind::Array { .. } => "array type".to_string(),
            TypeExprKind::Map { .. } => "map type".to_string(),
            TypeExprKind::Chan { .. } => "channel type".to_string(),
            TypeExprKind::Ellipsis(_) => "variadic parameter".to_string(),
            TypeExprKind::Func(_) => "function type".to_string(),
            TypeExprKind::Interface(_) => "interface type".to_string(),
            TypeExprKind::Struct { .. } => "struct type".to_string(),
            TypeExprKind::Generic { base, .. } => format!("generic instantiation {}", base.shape()),
            TypeExprKind::Union(_) => "type union".to_string(),
            TypeExprKind::Negated(inner) => format!("~{}", inner.shape()),
            TypeExprKind::Other(kind) => kind.clone(),
        }
    }
}
