//! Model construction from an entry source file.
//!
//! A [`Resolver`] parses the entry file and any auxiliary files, then
//! resolves every interface it declares, following embedded interfaces into
//! auxiliary files and other packages. External packages are located through
//! the [`BuildEnv`], parsed on first use and cached for the rest of the run.

mod types;

pub use types::{Translated, TypeTranslator};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{Position, ResolveError, Result};
use crate::imports::ImportTable;
use crate::locate::BuildEnv;
use crate::model::{Interface, Method, Package, Struct};
use crate::scan::{self, NamedInterface, NamedStruct};
use crate::syntax::{GoParser, InterfaceElem, SourceFile, TypeExpr, TypeExprKind};

/// Explicit inputs of a resolve run.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// `(name, path)` imports that take precedence over the entry file's.
    /// A name of `.` adds a dot import.
    pub imports: Vec<(String, String)>,
    /// `(package name, file)` pairs whose interfaces may be embedded as
    /// `name.Interface`.
    pub aux_files: Vec<(String, PathBuf)>,
    /// Ask the build environment for the real name of unnamed imports
    /// instead of guessing it from the path.
    pub lookup_package_names: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            imports: Vec::new(),
            aux_files: Vec::new(),
            lookup_package_names: true,
        }
    }
}

/// Declarations visible while resolving inside one package.
struct PackageScope {
    /// Import path of the package.
    path: String,
    /// Directory the package was found in; lookups of its imports start here.
    dir: PathBuf,
    imports: ImportTable,
    /// Interfaces keyed by (package context, name).
    interfaces: HashMap<(String, String), Rc<NamedInterface>>,
}

/// Guard key: scope, package context, interface name.
type InProgress = (String, String, String);

/// Builds a [`Package`] model for one entry file.
///
/// A resolver is consumed by [`Resolver::resolve`]; every cache it holds
/// lives for that one call.
pub struct Resolver<'env> {
    env: &'env dyn BuildEnv,
    parser: GoParser,
    config: ResolverConfig,
    /// External packages by import path.
    packages: HashMap<String, Rc<PackageScope>>,
    /// Declared package names by import path.
    names: RefCell<HashMap<String, Option<String>>>,
    in_progress: HashSet<InProgress>,
}

impl<'env> Resolver<'env> {
    pub fn new(env: &'env dyn BuildEnv, config: ResolverConfig) -> Result<Self> {
        Ok(Self {
            env,
            parser: GoParser::new()?,
            config,
            packages: HashMap::new(),
            names: RefCell::new(HashMap::new()),
            in_progress: HashSet::new(),
        })
    }

    /// Resolve every interface and struct declared in `entry`.
    #[tracing::instrument(skip(self, entry), fields(entry = %entry.display()))]
    pub fn resolve(mut self, entry: &Path) -> Result<Package> {
        let absolute = std::fs::canonicalize(entry).map_err(|e| ResolveError::io(entry, e))?;
        let src_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| absolute.clone());
        let package_path = self.env.import_path_of_dir(&src_dir)?;
        tracing::debug!(%package_path, "entry package located");

        let file = self.parse_source(entry)?;
        let file_imports = ImportTable::from_specs(&file.imports, |p| self.lookup_name(p, &src_dir));

        // Overrides first so the file's own imports cannot replace them.
        let mut imports = ImportTable::default();
        for path in file_imports.dot_imports() {
            imports.add_dot_import(path);
        }
        for (name, path) in &self.config.imports {
            imports.set(name, path);
        }
        imports.merge_missing(&file_imports);

        let mut interfaces = HashMap::new();
        for (package, aux_path) in &self.config.aux_files {
            let aux = self.parse_source(aux_path)?;
            let aux_imports = ImportTable::from_specs(&aux.imports, |p| self.lookup_name(p, &src_dir));
            imports.merge_missing(&aux_imports);
            for decl in scan::interfaces(&aux) {
                interfaces.insert((package.clone(), decl.name.name.clone()), Rc::new(decl));
            }
            tracing::debug!(package = %package, file = %aux_path.display(), "registered auxiliary file");
        }
        for decl in scan::interfaces(&file) {
            interfaces.insert((package_path.clone(), decl.name.name.clone()), Rc::new(decl));
        }

        let scope = Rc::new(PackageScope {
            path: package_path.clone(),
            dir: src_dir,
            imports,
            interfaces,
        });

        let mut resolved = Vec::new();
        for decl in scan::interfaces(&file) {
            resolved.push(self.resolve_interface(&scope, &package_path, &decl)?);
        }
        let structs = scan::structs(&file).map(translate_struct).collect();

        tracing::debug!(
            interfaces = resolved.len(),
            packages_loaded = self.packages.len(),
            "resolved entry file"
        );

        Ok(Package {
            name: file.package.name.clone(),
            path: package_path,
            interfaces: resolved,
            structs,
            dot_imports: scope.imports.dot_imports().to_vec(),
        })
    }

    fn parse_source(&self, path: &Path) -> Result<SourceFile> {
        let source = self.env.read_source(path)?;
        self.parser.parse(path, &source)
    }

    fn lookup_name(&self, import_path: &str, from_dir: &Path) -> Option<String> {
        if !self.config.lookup_package_names {
            return None;
        }
        if let Some(name) = self.names.borrow().get(import_path) {
            return name.clone();
        }
        let name = self.env.package_name(import_path, from_dir);
        self.names
            .borrow_mut()
            .insert(import_path.to_string(), name.clone());
        name
    }

    /// Own methods first, then each embedded interface's methods in order.
    fn resolve_interface(
        &mut self,
        scope: &Rc<PackageScope>,
        package: &str,
        decl: &NamedInterface,
    ) -> Result<Interface> {
        let key = guard_key(scope, package, &decl.name.name);
        self.in_progress.insert(key.clone());
        let methods = self.interface_methods(scope, package, decl);
        self.in_progress.remove(&key);

        Ok(Interface {
            name: decl.name.name.clone(),
            doc: decl.doc.clone(),
            comment: decl.comment.clone(),
            methods: methods?,
        })
    }

    fn interface_methods(
        &mut self,
        scope: &Rc<PackageScope>,
        package: &str,
        decl: &NamedInterface,
    ) -> Result<Vec<Method>> {
        let translator = TypeTranslator::new(&scope.imports, &decl.file);
        let mut methods = Vec::new();

        for elem in &decl.elems {
            if let InterfaceElem::Method(spec) = elem {
                let (inputs, variadic, outputs) = translator.signature(package, &spec.signature)?;
                methods.push(Method {
                    name: spec.name.name.clone(),
                    doc: spec.doc.clone(),
                    comment: spec.comment.clone(),
                    inputs,
                    variadic,
                    outputs,
                });
            }
        }

        for elem in &decl.elems {
            if let InterfaceElem::Embed(ty) = elem {
                let embedded = self.resolve_embed(scope, package, decl, ty)?;
                methods.extend(embedded.methods);
            }
        }

        Ok(methods)
    }

    fn resolve_embed(
        &mut self,
        scope: &Rc<PackageScope>,
        package: &str,
        decl: &NamedInterface,
        ty: &TypeExpr,
    ) -> Result<Interface> {
        let at = Position::new(&decl.file, ty.pos);

        match &ty.kind {
            TypeExprKind::Ident(name) => {
                let key = (package.to_string(), name.clone());
                let Some(embedded) = scope.interfaces.get(&key).cloned() else {
                    return Err(ResolveError::UnknownEmbeddedInterface {
                        at,
                        name: name.clone(),
                    });
                };
                self.resolve_nested(scope, package, &embedded, at)
            }
            TypeExprKind::Qualified { package: alias, name } => {
                let Some(imported) = scope.imports.get(&alias.name) else {
                    return Err(ResolveError::UnknownPackage {
                        at: Position::new(&decl.file, alias.pos),
                        name: alias.name.clone(),
                    });
                };

                // Auxiliary files are registered under the short name.
                let aux_key = (alias.name.clone(), name.clone());
                if let Some(embedded) = scope.interfaces.get(&aux_key).cloned() {
                    return self.resolve_nested(scope, &alias.name, &embedded, at);
                }

                let path = imported.path_at(|| at.clone())?.to_string();
                let external = self.load_package(&path, &scope.dir, &at)?;
                let Some(embedded) = external.interfaces.get(&(path.clone(), name.clone())).cloned()
                else {
                    return Err(ResolveError::UnknownEmbeddedInterface {
                        at,
                        name: format!("{}.{}", path, name),
                    });
                };
                self.resolve_nested(&external, &path, &embedded, at)
            }
            _ => Err(ResolveError::UnsupportedEmbedding {
                at,
                interface: decl.name.name.clone(),
                shape: ty.shape(),
            }),
        }
    }

    fn resolve_nested(
        &mut self,
        scope: &Rc<PackageScope>,
        package: &str,
        decl: &NamedInterface,
        at: Position,
    ) -> Result<Interface> {
        if self
            .in_progress
            .contains(&guard_key(scope, package, &decl.name.name))
        {
            return Err(ResolveError::CyclicEmbedding {
                at,
                package: package.to_string(),
                name: decl.name.name.clone(),
            });
        }
        tracing::debug!(package, interface = %decl.name, "resolving embedded interface");
        self.resolve_interface(scope, package, decl)
    }

    /// The scope of an external package, loading it on first use.
    fn load_package(&mut self, path: &str, from_dir: &Path, at: &Position) -> Result<Rc<PackageScope>> {
        if let Some(scope) = self.packages.get(path) {
            tracing::debug!(path, "package cache hit");
            return Ok(Rc::clone(scope));
        }

        let scope = self
            .parse_package(path, from_dir)
            .map_err(|source| ResolveError::PackageLoad {
                at: at.clone(),
                path: path.to_string(),
                source: Box::new(source),
            })?;
        let scope = Rc::new(scope);
        self.packages.insert(path.to_string(), Rc::clone(&scope));
        Ok(scope)
    }

    #[tracing::instrument(skip(self, from_dir))]
    fn parse_package(&self, path: &str, from_dir: &Path) -> Result<PackageScope> {
        let dir = self.env.find_package_dir(path, from_dir)?;
        let files = self.env.go_files(&dir)?;
        if files.is_empty() {
            return Err(ResolveError::NoSourceFile(dir));
        }

        let mut specs = Vec::new();
        let mut interfaces = HashMap::new();
        for file in &files {
            let parsed = self.parse_source(file)?;
            for decl in scan::interfaces(&parsed) {
                interfaces.insert((path.to_string(), decl.name.name.clone()), Rc::new(decl));
            }
            specs.extend(parsed.imports);
        }
        let imports = ImportTable::from_specs(&specs, |p| self.lookup_name(p, &dir));

        tracing::debug!(
            dir = %dir.display(),
            files = files.len(),
            interfaces = interfaces.len(),
            "loaded package"
        );

        Ok(PackageScope {
            path: path.to_string(),
            dir,
            imports,
            interfaces,
        })
    }
}

fn guard_key(scope: &PackageScope, package: &str, name: &str) -> InProgress {
    (scope.path.clone(), package.to_string(), name.to_string())
}

/// Existing methods are recorded by name; their signatures are not needed.
fn translate_struct(decl: NamedStruct) -> Struct {
    let methods = decl
        .methods
        .into_iter()
        .map(|func| {
            let method = Method {
                doc: func.doc,
                comment: func.comment,
                ..Method::named(func.name.name.clone())
            };
            (func.name.name, method)
        })
        .collect();

    Struct {
        name: decl.name.name,
        doc: decl.doc,
        comment: decl.comment,
        methods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Parameter, Type};
    use std::fs;

    /// A build environment over a fixed set of in-memory files.
    struct FakeEnv {
        import_path: String,
        files: HashMap<PathBuf, String>,
        /// import path → package directory
        packages: HashMap<String, PathBuf>,
        loads: RefCell<Vec<PathBuf>>,
    }

    impl FakeEnv {
        fn new(import_path: &str) -> Self {
            Self {
                import_path: import_path.to_string(),
                files: HashMap::new(),
                packages: HashMap::new(),
                loads: RefCell::new(Vec::new()),
            }
        }

        fn package(mut self, import_path: &str, dir: &str, files: &[(&str, &str)]) -> Self {
            let dir = PathBuf::from(dir);
            for (name, content) in files {
                self.files.insert(dir.join(name), content.to_string());
            }
            self.packages.insert(import_path.to_string(), dir);
            self
        }
    }

    impl BuildEnv for FakeEnv {
        fn import_path_of_dir(&self, _dir: &Path) -> Result<String> {
            Ok(self.import_path.clone())
        }

        fn find_package_dir(&self, import_path: &str, from_dir: &Path) -> Result<PathBuf> {
            self.packages
                .get(import_path)
                .cloned()
                .ok_or_else(|| ResolveError::PackageNotFound {
                    path: import_path.to_string(),
                    dir: from_dir.to_path_buf(),
                })
        }

        fn package_name(&self, _import_path: &str, _from_dir: &Path) -> Option<String> {
            None
        }

        fn go_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
            self.loads.borrow_mut().push(dir.to_path_buf());
            let mut files: Vec<PathBuf> = self
                .files
                .keys()
                .filter(|f| f.parent() == Some(dir))
                .cloned()
                .collect();
            files.sort();
            Ok(files)
        }

        fn read_source(&self, path: &Path) -> Result<Vec<u8>> {
            match self.files.get(path) {
                Some(content) => Ok(content.as_bytes().to_vec()),
                None => fs::read(path).map_err(|e| ResolveError::io(path, e)),
            }
        }
    }

    fn resolve(env: &FakeEnv, entry: &str, config: ResolverConfig) -> Result<Package> {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("entry.go");
        fs::write(&path, entry).unwrap();
        Resolver::new(env, config).unwrap().resolve(&path)
    }

    #[test]
    fn test_documented_interface() {
        let env = FakeEnv::new("example.com/foo");
        let pkg = resolve(
            &env,
            r#"package foo

// Doc:Test Foo
type Foo interface {
	Bar(x int) int // Comment:Foo.Bar
}
"#,
            ResolverConfig::default(),
        )
        .unwrap();

        assert_eq!(pkg.name, "foo");
        assert_eq!(pkg.path, "example.com/foo");
        let foo = pkg.interface("Foo").unwrap();
        assert_eq!(
            foo,
            &Interface {
                name: "Foo".to_string(),
                doc: vec!["Doc:Test Foo".to_string()],
                comment: None,
                methods: vec![Method {
                    name: "Bar".to_string(),
                    doc: vec![],
                    comment: Some("Comment:Foo.Bar".to_string()),
                    inputs: vec![Parameter::new("x", Type::predeclared("int"))],
                    variadic: None,
                    outputs: vec![Parameter::anonymous(Type::predeclared("int"))],
                }],
            }
        );
    }

    #[test]
    fn test_local_embedding_appends_methods() {
        let env = FakeEnv::new("example.com/foo");
        let pkg = resolve(
            &env,
            r#"package foo

type A interface {
	Own()
	B
	C
}

type B interface { M() Item }

type C interface { M() }
"#,
            ResolverConfig::default(),
        )
        .unwrap();

        let names: Vec<&str> = pkg.interface("A").unwrap().methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Own", "M", "M"]);
        assert_eq!(
            pkg.interface("A").unwrap().methods[1].outputs[0].ty,
            Type::named("example.com/foo", "Item")
        );
    }

    #[test]
    fn test_embedded_methods_follow_own_methods() {
        let env = FakeEnv::new("example.com/foo");
        let pkg = resolve(
            &env,
            r#"package foo

type A interface {
	B
	Own()
}

type B interface { M() }
"#,
            ResolverConfig::default(),
        )
        .unwrap();

        let names: Vec<&str> = pkg.interface("A").unwrap().methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Own", "M"]);
    }

    #[test]
    fn test_cyclic_embedding_fails() {
        let env = FakeEnv::new("example.com/foo");
        let err = resolve(
            &env,
            "package foo\n\ntype A interface { B }\n\ntype B interface { A }\n",
            ResolverConfig::default(),
        )
        .unwrap_err();

        match err {
            ResolveError::CyclicEmbedding { at, name, .. } => {
                assert_eq!(name, "A");
                assert_eq!(at.line, 5);
            }
            other => panic!("expected cyclic embedding, got {:?}", other),
        }
    }

    #[test]
    fn test_external_package_loaded_once() {
        let env = FakeEnv::new("example.com/app").package(
            "example.com/io",
            "/pkgs/io",
            &[
                ("reader.go", "package io\n\ntype Reader interface { Read(p []byte) (int, error) }\n"),
                ("closer.go", "package io\n\ntype Closer interface { Close() error }\n\ntype ReadCloser interface {\n\tReader\n\tCloser\n}\n"),
            ],
        );

        let pkg = resolve(
            &env,
            r#"package app

import "example.com/io"

type Stream interface {
	io.ReadCloser
	io.Reader
}
"#,
            ResolverConfig::default(),
        )
        .unwrap();

        let stream = pkg.interface("Stream").unwrap();
        let names: Vec<&str> = stream.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Read", "Close", "Read"]);
        assert_eq!(stream.methods[0].inputs[0].ty.to_string(), "[]byte");
        assert_eq!(env.loads.borrow().len(), 1);
    }

    #[test]
    fn test_unknown_references() {
        let env = FakeEnv::new("example.com/app").package(
            "example.com/io",
            "/pkgs/io",
            &[("io.go", "package io\n\ntype Reader interface{}\n")],
        );

        let err = resolve(&env, "package app\n\ntype A interface { Missing }\n", ResolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownEmbeddedInterface { ref name, .. } if name == "Missing"));

        let err = resolve(&env, "package app\n\ntype A interface { nope.Reader }\n", ResolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownPackage { ref name, .. } if name == "nope"));

        let err = resolve(
            &env,
            "package app\n\nimport \"example.com/io\"\n\ntype A interface { io.Writer }\n",
            ResolverConfig::default(),
        )
        .unwrap_err();
        assert!(
            matches!(err, ResolveError::UnknownEmbeddedInterface { ref name, .. } if name == "example.com/io.Writer")
        );

        let err = resolve(
            &env,
            "package app\n\nimport \"example.com/gone\"\n\ntype A interface { gone.X }\n",
            ResolverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::PackageLoad { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn test_unsupported_embedding() {
        let env = FakeEnv::new("example.com/app");
        let err = resolve(
            &env,
            "package app\n\ntype Number interface { ~int | ~float64 }\n",
            ResolverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedEmbedding { ref interface, .. } if interface == "Number"));
    }

    #[test]
    fn test_structs_and_overrides() {
        let env = FakeEnv::new("example.com/app");
        let config = ResolverConfig {
            imports: vec![
                ("log".to_string(), "example.com/override/log".to_string()),
                (".".to_string(), "example.com/dsl".to_string()),
            ],
            ..ResolverConfig::default()
        };
        let pkg = resolve(
            &env,
            r#"package app

import (
	. "example.com/matchers"
	"example.com/file/log"
)

type Logger interface { Get() log.Entry }

// Impl docs
type Impl struct{}

// Get docs
func (i *Impl) Get() log.Entry { return log.Entry{} }
"#,
            config,
        )
        .unwrap();

        assert_eq!(
            pkg.interface("Logger").unwrap().methods[0].outputs[0].ty,
            Type::named("example.com/override/log", "Entry")
        );
        assert_eq!(
            pkg.dot_imports,
            vec!["example.com/matchers".to_string(), "example.com/dsl".to_string()]
        );

        let imp = pkg.structure("Impl").unwrap();
        assert_eq!(imp.doc, vec!["Impl docs".to_string()]);
        assert_eq!(imp.methods["Get"].doc, vec!["Get docs".to_string()]);
        assert!(imp.methods["Get"].outputs.is_empty());
    }
}
