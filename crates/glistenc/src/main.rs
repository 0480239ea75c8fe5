//! The Glisten compiler CLI.
//!
//! Compiles one or more shader sources into one compact string per
//! `export`-marked entry point, packaged as JSON or as host-language
//! constants:
//!
//! - `glistenc shader.glsl` - compile to JSON on stdout
//! - `--output <file>` - write the packaged result to a file
//! - `--format json|js|skew|cpp|rust` - packaging format
//! - `--renaming all|internal-only|none` - symbol renaming policy
//! - `--disable-rewriting` - skip folding, DCE, and compaction
//! - `--pretty-print` - emit the canonical pretty form
//! - `--keep-symbols` - keep declarations unreachable from the exports

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use ariadne::{Label, Report, ReportKind, Source};
use clap::{Parser, ValueEnum};
use glisten_common::diag::Severity;
use glisten_parser::Compilation;
use glistenc::output::{format_result, OutputFormat};
use glistenc::{compile, Options, RenameSymbols};

#[derive(Parser)]
#[command(name = "glistenc", version, about = "GLSL shader compiler and minifier")]
struct Cli {
    /// Input shader files
    inputs: Vec<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Packaging format for the compiled shaders
    #[arg(long, value_enum, default_value = "json")]
    format: FormatArg,

    /// Symbol renaming policy
    #[arg(long, value_enum, default_value = "all")]
    renaming: RenamingArg,

    /// Skip constant folding, dead-code elimination, and compaction
    #[arg(long)]
    disable_rewriting: bool,

    /// Emit the canonical pretty form instead of minified output
    #[arg(long)]
    pretty_print: bool,

    /// Keep declarations unreachable from the exports
    #[arg(long)]
    keep_symbols: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Js,
    Skew,
    Cpp,
    Rust,
}

#[derive(Clone, Copy, ValueEnum)]
enum RenamingArg {
    All,
    InternalOnly,
    None,
}

fn main() {
    let cli = Cli::parse();
    if cli.inputs.is_empty() {
        eprintln!("error: no input files");
        process::exit(1);
    }
    if let Err(message) = run(&cli) {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut sources = Vec::new();
    for path in &cli.inputs {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {e}", path.display()))?;
        sources.push((path.display().to_string(), contents));
    }

    // `#include` resolves relative to the including file.
    let file_access: &glistenc::FileAccess = &|includer, relative| {
        let base = Path::new(includer).parent().unwrap_or_else(|| Path::new("."));
        let path = base.join(relative);
        let contents = fs::read_to_string(&path).ok()?;
        Some((path.display().to_string(), contents))
    };

    let options = Options {
        compact_syntax_tree: !cli.disable_rewriting,
        remove_whitespace: !cli.pretty_print,
        rename_symbols: match cli.renaming {
            RenamingArg::All => RenameSymbols::All,
            RenamingArg::InternalOnly => RenameSymbols::Internal,
            RenamingArg::None => RenameSymbols::None,
        },
        trim_symbols: !cli.keep_symbols,
        file_access: Some(file_access),
    };

    let source_refs: Vec<(&str, &str)> = sources
        .iter()
        .map(|(name, contents)| (name.as_str(), contents.as_str()))
        .collect();
    let output = compile(&source_refs, &options);

    report_diagnostics(&output.compilation);
    let Some(result) = output.result else {
        return Err("compilation failed because of the errors above".to_string());
    };

    let format = match cli.format {
        FormatArg::Json => OutputFormat::Json,
        FormatArg::Js => OutputFormat::Js,
        FormatArg::Skew => OutputFormat::Skew,
        FormatArg::Cpp => OutputFormat::Cpp,
        FormatArg::Rust => OutputFormat::Rust,
    };
    let text = format_result(&result, format);

    match &cli.output {
        Some(path) => fs::write(path, text)
            .map_err(|e| format!("cannot write '{}': {e}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}

/// Render every diagnostic with ariadne, in discovery order.
fn report_diagnostics(comp: &Compilation) {
    for diagnostic in comp.log.diagnostics() {
        let source = comp.sources.get(diagnostic.range.source);
        let start = diagnostic.range.span.start as usize;
        let end = (diagnostic.range.span.end as usize).max(start + 1);
        let kind = match diagnostic.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let _ = Report::<std::ops::Range<usize>>::build(kind, start..end)
            .with_message(format!("{} [{}]", diagnostic.message, diagnostic.kind))
            .with_label(Label::new(start..end).with_message(&diagnostic.message))
            .finish()
            .eprint(Source::from(source.contents.as_str()));
    }
}
