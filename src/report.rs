//! Output formatting for resolved packages.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: the full model for programmatic consumption

use std::fmt::Write as _;

use colored::*;
use serde::Serialize;

use crate::model::{Method, Package, Parameter};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" | "text" => Ok(Format::Pretty),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format {:?} (expected pretty or json)", other)),
        }
    }
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub source: &'a str,
    pub package: &'a Package,
}

pub fn render_json(source: &str, package: &Package) -> anyhow::Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        source,
        package,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn write_json(source: &str, package: &Package) -> anyhow::Result<()> {
    println!("{}", render_json(source, package)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

pub fn write_pretty(source: &str, package: &Package) {
    print!("{}", render_pretty(source, package));
}

pub fn render_pretty(source: &str, package: &Package) -> String {
    let mut out = String::new();

    // Header
    let _ = writeln!(out);
    let _ = writeln!(out, "  {} v{}", "implgen".cyan().bold(), env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}{}", "Source:  ".dimmed(), source);
    let _ = writeln!(out, "  {}{} ({})", "Package: ".dimmed(), package.name.bold(), package.path);
    if !package.dot_imports.is_empty() {
        let _ = writeln!(out, "  {}{}", "Dot imports: ".dimmed(), package.dot_imports.join(", "));
    }
    let _ = writeln!(out);

    write_interfaces(&mut out, package);
    write_structs(&mut out, package);

    let _ = writeln!(
        out,
        "  {} {} interfaces, {} structs",
        "✓".green().bold(),
        package.interfaces.len(),
        package.structs.len()
    );
    let _ = writeln!(out);
    out
}

fn write_interfaces(out: &mut String, package: &Package) {
    if package.interfaces.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {}", format!("Interfaces ({})", package.interfaces.len()).bold());
    for intf in &package.interfaces {
        write_doc(out, &intf.doc, 4);
        let _ = write!(out, "    {}", intf.name.cyan());
        write_trailing(out, intf.comment.as_deref());
        for method in &intf.methods {
            write_doc(out, &method.doc, 6);
            let _ = write!(out, "      {}", method_signature(method));
            write_trailing(out, method.comment.as_deref());
        }
    }
    let _ = writeln!(out);
}

fn write_structs(out: &mut String, package: &Package) {
    if package.structs.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {}", format!("Structs ({})", package.structs.len()).bold());
    for st in &package.structs {
        write_doc(out, &st.doc, 4);
        let _ = write!(out, "    {}", st.name.cyan());
        write_trailing(out, st.comment.as_deref());
        for name in st.methods.keys() {
            let _ = writeln!(out, "      {}", name);
        }
    }
    let _ = writeln!(out);
}

fn write_doc(out: &mut String, doc: &[String], indent: usize) {
    for line in doc {
        let _ = writeln!(out, "{:indent$}{}", "", format!("// {}", line).dimmed(), indent = indent);
    }
}

fn write_trailing(out: &mut String, comment: Option<&str>) {
    match comment {
        Some(comment) => {
            let _ = writeln!(out, "  {}", format!("// {}", comment).dimmed());
        }
        None => {
            let _ = writeln!(out);
        }
    }
}

/// `Name(a int, rest ...string) (T, error)` with fully qualified types.
pub fn method_signature(method: &Method) -> String {
    let mut args: Vec<String> = method.inputs.iter().map(param).collect();
    if let Some(variadic) = &method.variadic {
        let ty = format!("...{}", variadic.ty);
        args.push(match &variadic.name {
            Some(name) => format!("{} {}", name, ty),
            None => ty,
        });
    }

    let results: Vec<String> = method.outputs.iter().map(param).collect();
    let results = match results.as_slice() {
        [] => String::new(),
        [single] if method.outputs[0].name.is_none() => format!(" {}", single),
        _ => format!(" ({})", results.join(", ")),
    };

    format!("{}({}){}", method.name, args.join(", "), results)
}

fn param(p: &Parameter) -> String {
    match &p.name {
        Some(name) => format!("{} {}", name, p.ty),
        None => p.ty.to_string(),
    }
}
