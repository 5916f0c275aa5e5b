//! Declaration scanning.
//!
//! Walks a file's top-level declarations and yields its interfaces and its
//! structs, the latter paired with every method whose receiver names them.

use std::collections::HashMap;

use crate::syntax::{Decl, FuncDecl, Ident, InterfaceElem, SourceFile, TypeExprKind, TypeSpec};

/// A named interface declaration.
#[derive(Debug, Clone)]
pub struct NamedInterface {
    pub name: Ident,
    pub doc: Vec<String>,
    pub comment: Option<String>,
    pub elems: Vec<InterfaceElem>,
    /// File the declaration came from, for error positions.
    pub file: String,
}

/// A named struct declaration with its receiver methods.
#[derive(Debug, Clone)]
pub struct NamedStruct {
    pub name: Ident,
    pub doc: Vec<String>,
    pub comment: Option<String>,
    pub methods: Vec<FuncDecl>,
}

/// Iterate over every interface declared in `file`, in source order.
pub fn interfaces(file: &SourceFile) -> impl Iterator<Item = NamedInterface> + '_ {
    type_specs(file).filter_map(move |(decl_doc, spec)| match &spec.ty.kind {
        TypeExprKind::Interface(elems) => Some(NamedInterface {
            name: spec.name.clone(),
            doc: spec_doc(decl_doc, spec),
            comment: spec.comment.clone(),
            elems: elems.clone(),
            file: file.path.clone(),
        }),
        _ => None,
    })
}

/// Iterate over every struct declared in `file`, in source order.
///
/// Receiver methods are attached in a second pass over the file, so a method
/// declared before its struct is still found.
pub fn structs(file: &SourceFile) -> std::vec::IntoIter<NamedStruct> {
    let mut found: Vec<NamedStruct> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (decl_doc, spec) in type_specs(file) {
        if let TypeExprKind::Struct { .. } = spec.ty.kind {
            index.insert(spec.name.name.clone(), found.len());
            found.push(NamedStruct {
                name: spec.name.clone(),
                doc: spec_doc(decl_doc, spec),
                comment: spec.comment.clone(),
                methods: Vec::new(),
            });
        }
    }

    for decl in &file.decls {
        let Decl::Func(func) = decl else {
            continue;
        };
        let Some(base) = func.receiver.as_ref().and_then(|r| r.base.as_ref()) else {
            continue;
        };
        if let Some(&i) = index.get(base) {
            found[i].methods.push(func.clone());
        }
    }

    found.into_iter()
}

/// Every type spec in the file paired with its declaration's doc comment.
fn type_specs(file: &SourceFile) -> impl Iterator<Item = (&[String], &TypeSpec)> + '_ {
    file.decls
        .iter()
        .filter_map(|decl| match decl {
            Decl::Type(td) => Some(td),
            Decl::Func(_) => None,
        })
        .flat_map(|td| td.specs.iter().map(move |spec| (td.doc.as_slice(), spec)))
}

/// Grouped specs may carry their own doc; otherwise the declaration's applies.
fn spec_doc(decl_doc: &[String], spec: &TypeSpec) -> Vec<String> {
    if spec.doc.is_empty() {
        decl_doc.to_vec()
    } else {
        spec.doc.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::GoParser;
    use std::path::Path;

    fn parse_go(source: &str) -> SourceFile {
        GoParser::new()
            .unwrap()
            .parse(Path::new("scan.go"), source.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_interfaces_in_source_order() {
        let file = parse_go(
            r#"
package foo

type Zeta interface{ Z() }

type Config struct{}

type (
    // Alpha docs
    Alpha interface{ A() }
    Beta  interface{ B() }
)
"#,
        );

        let names: Vec<String> = interfaces(&file).map(|i| i.name.name).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Beta"]);

        let alpha = interfaces(&file).find(|i| i.name.name == "Alpha").unwrap();
        assert_eq!(alpha.doc, vec!["Alpha docs".to_string()]);
        assert_eq!(alpha.file, "scan.go");
    }

    #[test]
    fn test_structs_with_receiver_methods() {
        let file = parse_go(
            r#"
package foo

func (s *Store) Early() {}

// Store docs
type Store struct {
    items map[string]int
}

type Other struct{}

func (s Store) Get(key string) int { return s.items[key] }

func (o *Other) Run() {}

func (u Unknown) Ignored() {}

func free() {}
"#,
        );

        let found: Vec<NamedStruct> = structs(&file).collect();
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].name.name, "Store");
        assert_eq!(found[0].doc, vec!["Store docs".to_string()]);
        let methods: Vec<&str> = found[0].methods.iter().map(|m| m.name.name.as_str()).collect();
        assert_eq!(methods, vec!["Early", "Get"]);

        assert_eq!(found[1].name.name, "Other");
        assert_eq!(found[1].methods.len(), 1);
    }

    #[test]
    fn test_no_declarations() {
        let file = parse_go("package empty\n");
        assert_eq!(interfaces(&file).count(), 0);
        assert_eq!(structs(&file).count(), 0);
    }
}
