//! Error types for model construction.
//!
//! Every failure aborts the enclosing resolve call. Errors carry the
//! `file:line:column` of the offending syntax where one exists.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::syntax::Pos;

/// A source location used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Position {
    pub fn new(file: &str, pos: Pos) -> Self {
        Self {
            file: file.to_string(),
            line: pos.line,
            column: pos.column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Broad classification of a [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Entry directory outside any workspace, or no source file found.
    Location,
    /// Syntax the model cannot express, or input that does not parse.
    Grammar,
    /// Unknown package or interface, ambiguous import, cyclic embedding.
    Reference,
    /// Unreadable files, packages that cannot be located.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Location => "location",
            ErrorKind::Grammar => "grammar",
            ErrorKind::Reference => "reference",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised while locating, parsing and resolving Go sources.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("source directory {} is outside any module or GOPATH", .0.display())]
    OutsideWorkspace(PathBuf),

    #[error("GOPATH is not set")]
    GopathNotSet,

    #[error("go source file not found in {}", .0.display())]
    NoSourceFile(PathBuf),

    #[error("{at}: syntax error")]
    Syntax { at: Position },

    #[error("{at}: don't know how to translate type {shape}")]
    UnknownTypeShape { at: Position, shape: String },

    #[error("{at}: can't handle non-empty unnamed {what} types")]
    NonEmptyAnonymous { at: Position, what: &'static str },

    #[error("{at}: bad array size {len:?}")]
    BadArraySize { at: Position, len: String },

    #[error("{at}: unsupported embedding of {shape} in interface {interface}")]
    UnsupportedEmbedding {
        at: Position,
        interface: String,
        shape: String,
    },

    #[error("{at}: unknown package {name:?}")]
    UnknownPackage { at: Position, name: String },

    #[error("{at}: unknown embedded interface {name}")]
    UnknownEmbeddedInterface { at: Position, name: String },

    #[error("{at}: {name:?} is ambiguous because of duplicate imports: {}", .paths.join(", "))]
    AmbiguousImport {
        at: Position,
        name: String,
        paths: Vec<String>,
    },

    #[error("{at}: cyclic embedding of interface {name} in package {package}")]
    CyclicEmbedding {
        at: Position,
        package: String,
        name: String,
    },

    #[error("{at}: could not parse package {path}: {source}")]
    PackageLoad {
        at: Position,
        path: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("cannot find package {path:?} from {}", .dir.display())]
    PackageNotFound { path: String, dir: PathBuf },

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid go.mod {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("tree-sitter: {0}")]
    Parser(String),
}

impl ResolveError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ResolveError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify the error. Package load failures report the kind of their cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::OutsideWorkspace(_)
            | ResolveError::GopathNotSet
            | ResolveError::NoSourceFile(_) => ErrorKind::Location,
            ResolveError::Syntax { .. }
            | ResolveError::UnknownTypeShape { .. }
            | ResolveError::NonEmptyAnonymous { .. }
            | ResolveError::BadArraySize { .. }
            | ResolveError::UnsupportedEmbedding { .. }
            | ResolveError::Parser(_) => ErrorKind::Grammar,
            ResolveError::UnknownPackage { .. }
            | ResolveError::UnknownEmbeddedInterface { .. }
            | ResolveError::AmbiguousImport { .. }
            | ResolveError::CyclicEmbedding { .. } => ErrorKind::Reference,
            ResolveError::PackageLoad { source, .. } => source.kind(),
            ResolveError::PackageNotFound { .. }
            | ResolveError::Io { .. }
            | ResolveError::Manifest { .. } => ErrorKind::Io,
        }
    }

    /// The source position attached to the error, if any.
    pub fn position(&self) -> Option<&Position> {
        match self {
            ResolveError::Syntax { at }
            | ResolveError::UnknownTypeShape { at, .. }
            | ResolveError::NonEmptyAnonymous { at, .. }
            | ResolveError::BadArraySize { at, .. }
            | ResolveError::UnsupportedEmbedding { at, .. }
            | ResolveError::UnknownPackage { at, .. }
            | ResolveError::UnknownEmbeddedInterface { at, .. }
            | ResolveError::AmbiguousImport { at, .. }
            | ResolveError::CyclicEmbedding { at, .. }
            | ResolveError::PackageLoad { at, .. } => Some(at),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
