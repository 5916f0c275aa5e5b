//! tree-sitter parsing and lowering into the owned syntax model.

use std::path::Path;

use once_cell::sync::Lazy;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::ast::{
    ArrayLen, ChanDir, Decl, Field, FuncDecl, Ident, ImportName, ImportSpec, InterfaceElem,
    MethodSpec, Pos, Receiver, Signature, SourceFile, TypeDecl, TypeExpr, TypeExprKind, TypeSpec,
};
use super::comments::{doc_comments, trailing_comment};
use crate::error::{Position, ResolveError, Result};

/// The Go grammar, shared by every parser.
static GO_LANGUAGE: Lazy<Language> = Lazy::new(|| tree_sitter_go::LANGUAGE.into());

/// Tree-sitter query for the package clause.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

/// Tree-sitter query for import specs, single and grouped.
const IMPORT_QUERY: &str = r#"
(import_spec
  path: (_) @path
) @import
"#;

/// Go source parser.
pub struct GoParser {
    package_query: Query,
    import_query: Query,
}

impl GoParser {
    /// Create a new Go parser.
    pub fn new() -> Result<Self> {
        let package_query = Query::new(&GO_LANGUAGE, PACKAGE_QUERY)
            .map_err(|e| ResolveError::Parser(e.to_string()))?;
        let import_query = Query::new(&GO_LANGUAGE, IMPORT_QUERY)
            .map_err(|e| ResolveError::Parser(e.to_string()))?;
        Ok(Self {
            package_query,
            import_query,
        })
    }

    fn create_parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&GO_LANGUAGE)
            .map_err(|e| ResolveError::Parser(e.to_string()))?;
        Ok(parser)
    }

    /// Parse Go source. Sources with syntax errors are rejected.
    pub fn parse(&self, path: &Path, source: &[u8]) -> Result<SourceFile> {
        let file = path.to_string_lossy().to_string();
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ResolveError::Parser(format!("failed to parse Go source: {}", file)))?;
        let root = tree.root_node();

        if let Some(bad) = first_error(root) {
            return Err(ResolveError::Syntax {
                at: Position::new(&file, Pos::from_node(bad)),
            });
        }

        let lowering = Lowering { source };
        let package = self.extract_package(root, source).ok_or_else(|| ResolveError::Syntax {
            at: Position::new(&file, Pos::from_node(root)),
        })?;
        let imports = self.extract_imports(&lowering, root);

        let mut decls = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "type_declaration" => decls.push(Decl::Type(lowering.type_decl(child))),
                "function_declaration" | "method_declaration" => {
                    decls.push(Decl::Func(lowering.func_decl(child)))
                }
                _ => {}
            }
        }

        Ok(SourceFile {
            path: file,
            package,
            imports,
            decls,
        })
    }

    /// Just the package clause. Syntax errors elsewhere in the file are ignored.
    pub fn package_name(&self, source: &[u8]) -> Option<String> {
        let mut parser = self.create_parser().ok()?;
        let tree = parser.parse(source, None)?;
        self.extract_package(tree.root_node(), source)
            .map(|ident| ident.name)
    }

    fn extract_package(&self, root: Node, source: &[u8]) -> Option<Ident> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.package_query, root, source);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = self.package_query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(Ident {
                        name: capture.node.utf8_text(source).unwrap_or("").to_string(),
                        pos: Pos::from_node(capture.node),
                    });
                }
            }
        }
        None
    }

    fn extract_imports(&self, lowering: &Lowering, root: Node) -> Vec<ImportSpec> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.import_query, root, lowering.source);

        let mut imports = Vec::new();
        while let Some(m) = matches.next() {
            let mut path = None;
            let mut spec = None;
            for capture in m.captures {
                match self.import_query.capture_names()[capture.index as usize] {
                    "path" => path = Some(capture.node),
                    "import" => spec = Some(capture.node),
                    _ => {}
                }
            }

            if let (Some(path), Some(spec)) = (path, spec) {
                let name = spec.child_by_field_name("name").map(|n| match n.kind() {
                    "dot" => ImportName::Dot,
                    "blank_identifier" => ImportName::Blank,
                    _ => ImportName::Alias(lowering.text(n).to_string()),
                });
                imports.push(ImportSpec {
                    name,
                    path: unquote(lowering.text(path)),
                    pos: Pos::from_node(spec),
                });
            }
        }

        // Query matches are not guaranteed to arrive in source order.
        imports.sort_by_key(|i| (i.pos.line, i.pos.column));
        imports
    }
}

/// Lowers tree-sitter nodes of one source buffer.
struct Lowering<'s> {
    source: &'s [u8],
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn ident(&self, node: Node) -> Ident {
        Ident {
            name: self.text(node).to_string(),
            pos: Pos::from_node(node),
        }
    }

    fn type_decl(&self, node: Node) -> TypeDecl {
        let mut specs = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if !matches!(child.kind(), "type_spec" | "alias_declaration") {
                continue;
            }
            let (Some(name), Some(ty)) = (
                child.child_by_field_name("name"),
                child.child_by_field_name("type"),
            ) else {
                continue;
            };
            specs.push(TypeSpec {
                name: self.ident(name),
                doc: doc_comments(child, self.source),
                comment: trailing_comment(child, self.source),
                ty: self.type_expr(ty),
            });
        }

        TypeDecl {
            doc: doc_comments(node, self.source),
            specs,
            pos: Pos::from_node(node),
        }
    }

    fn func_decl(&self, node: Node) -> FuncDecl {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.ident(n))
            .unwrap_or_else(|| Ident {
                name: String::new(),
                pos: Pos::from_node(node),
            });

        let receiver = node
            .child_by_field_name("receiver")
            .map(|list| self.receiver(list));

        FuncDecl {
            name,
            doc: doc_comments(node, self.source),
            comment: trailing_comment(node, self.source),
            receiver,
            signature: self.signature(node),
        }
    }

    /// Reduce a receiver list to the receiver's base type name.
    fn receiver(&self, list: Node) -> Receiver {
        let ty = named_children(list)
            .into_iter()
            .find(|c| c.kind() == "parameter_declaration")
            .and_then(|p| p.child_by_field_name("type"));

        let Some(mut ty) = ty else {
            return Receiver { base: None };
        };

        loop {
            match ty.kind() {
                "pointer_type" | "parenthesized_type" => {
                    match first_named(ty) {
                        Some(inner) => ty = inner,
                        None => break,
                    }
                }
                "generic_type" => match ty.child_by_field_name("type") {
                    Some(base) => ty = base,
                    None => break,
                },
                _ => break,
            }
        }

        let base = (ty.kind() == "type_identifier").then(|| self.text(ty).to_string());
        Receiver { base }
    }

    /// Lower the `parameters` and `result` fields of a function-like node.
    fn signature(&self, node: Node) -> Signature {
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.fields(p))
            .unwrap_or_default();

        let results = match node.child_by_field_name("result") {
            Some(r) if r.kind() == "parameter_list" => self.fields(r),
            Some(r) => vec![Field {
                names: Vec::new(),
                ty: self.type_expr(r),
                pos: Pos::from_node(r),
            }],
            None => Vec::new(),
        };

        Signature {
            params,
            results,
            pos: Pos::from_node(node),
        }
    }

    fn fields(&self, list: Node) -> Vec<Field> {
        let mut fields = Vec::new();
        for decl in named_children(list) {
            let Some(ty) = decl.child_by_field_name("type") else {
                continue;
            };
            let mut cursor = decl.walk();
            let names = decl
                .children_by_field_name("name", &mut cursor)
                .map(|n| self.ident(n))
                .collect();

            let ty = match decl.kind() {
                "parameter_declaration" => self.type_expr(ty),
                "variadic_parameter_declaration" => TypeExpr {
                    kind: TypeExprKind::Ellipsis(Box::new(self.type_expr(ty))),
                    pos: Pos::from_node(decl),
                },
                _ => continue,
            };

            fields.push(Field {
                names,
                ty,
                pos: Pos::from_node(decl),
            });
        }
        fields
    }

    fn type_expr(&self, node: Node) -> TypeExpr {
        let pos = Pos::from_node(node);
        let boxed = |field: &str| -> Box<TypeExpr> { Box::new(self.field_type(node, field)) };

        let kind = match node.kind() {
            "type_identifier" => TypeExprKind::Ident(self.text(node).to_string()),
            "qualified_type" => match (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) {
                (Some(package), Some(name)) => TypeExprKind::Qualified {
                    package: self.ident(package),
                    name: self.text(name).to_string(),
                },
                _ => TypeExprKind::Other(node.kind().to_string()),
            },
            "pointer_type" | "parenthesized_type" | "negated_type" => {
                let inner = match first_named(node) {
                    Some(inner) => Box::new(self.type_expr(inner)),
                    None => return other(node),
                };
                match node.kind() {
                    "pointer_type" => TypeExprKind::Pointer(inner),
                    "parenthesized_type" => TypeExprKind::Paren(inner),
                    _ => TypeExprKind::Negated(inner),
                }
            }
            "array_type" => TypeExprKind::Array {
                len: node.child_by_field_name("length").map(|l| ArrayLen {
                    text: self.text(l).to_string(),
                    literal: l.kind() == "int_literal",
                    pos: Pos::from_node(l),
                }),
                elem: boxed("element"),
            },
            "slice_type" => TypeExprKind::Array {
                len: None,
                elem: boxed("element"),
            },
            "map_type" => TypeExprKind::Map {
                key: boxed("key"),
                value: boxed("value"),
            },
            "channel_type" => TypeExprKind::Chan {
                dir: chan_dir(node),
                elem: boxed("value"),
            },
            "function_type" => TypeExprKind::Func(self.signature(node)),
            "interface_type" => TypeExprKind::Interface(self.interface_elems(node)),
            "struct_type" => TypeExprKind::Struct {
                fields: named_children(node)
                    .into_iter()
                    .filter(|c| c.kind() == "field_declaration_list")
                    .map(|list| {
                        named_children(list)
                            .into_iter()
                            .filter(|f| f.kind() == "field_declaration")
                            .count()
                    })
                    .sum(),
            },
            "generic_type" => {
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|a| {
                        named_children(a)
                            .into_iter()
                            .map(|t| self.type_expr(t))
                            .collect()
                    })
                    .unwrap_or_default();
                TypeExprKind::Generic {
                    base: boxed("type"),
                    args,
                }
            }
            "type_elem" | "constraint_elem" => {
                let mut terms = named_children(node);
                if terms.len() == 1 {
                    return self.type_expr(terms.remove(0));
                }
                TypeExprKind::Union(terms.into_iter().map(|t| self.type_expr(t)).collect())
            }
            _ => TypeExprKind::Other(node.kind().to_string()),
        };

        TypeExpr { kind, pos }
    }

    fn field_type(&self, node: Node, field: &str) -> TypeExpr {
        match node.child_by_field_name(field) {
            Some(child) => self.type_expr(child),
            None => other(node),
        }
    }

    fn interface_elems(&self, node: Node) -> Vec<InterfaceElem> {
        named_children(node)
            .into_iter()
            .map(|child| match child.kind() {
                "method_elem" | "method_spec" => InterfaceElem::Method(MethodSpec {
                    name: child
                        .child_by_field_name("name")
                        .map(|n| self.ident(n))
                        .unwrap_or_else(|| Ident {
                            name: String::new(),
                            pos: Pos::from_node(child),
                        }),
                    doc: doc_comments(child, self.source),
                    comment: trailing_comment(child, self.source),
                    signature: self.signature(child),
                }),
                _ => InterfaceElem::Embed(self.type_expr(child)),
            })
            .collect()
    }
}

fn other(node: Node) -> TypeExpr {
    TypeExpr {
        kind: TypeExprKind::Other(node.kind().to_string()),
        pos: Pos::from_node(node),
    }
}

/// Named children without comments.
fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children
}

fn first_named(node: Node) -> Option<Node> {
    named_children(node).into_iter().next()
}

/// `<-chan T` receives, `chan<- T` sends.
fn chan_dir(node: Node) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node
        .children(&mut cursor)
        .take(2)
        .map(|c| c.kind())
        .collect();
    match tokens.as_slice() {
        ["<-", ..] => ChanDir::Recv,
        ["chan", "<-"] => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

/// First ERROR or MISSING node in document order.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Remove the quotes of an interpreted or raw string literal.
fn unquote(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '`').to_string()
}
