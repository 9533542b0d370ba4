mod logging;

use clap::{Parser, Subcommand, ValueEnum};
use deskml_codegen::{CompileOptions, Compiler, CompilerOutput, Schema, TagDefinition};
use deskml_parser::{format_error, DEFAULT_MAX_DEPTH};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "deskml")]
#[command(about = "DeskML markup compiler")]
#[command(version)]
struct Cli {
    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a .dml file to a standalone HTML page
    Build {
        /// Input .dml file
        path: PathBuf,

        /// Output file (defaults to the input path with an .html extension)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Deepest tag nesting accepted
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Check a .dml file for errors without generating output
    Check {
        /// Input .dml file
        path: PathBuf,

        /// How to print diagnostics
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Deepest tag nesting accepted
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// List the tags and attributes the compiler understands
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot derive an output name from {}", .0.display())]
    OutputName(PathBuf),
    #[error("failed to serialize diagnostics: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Command::Build {
            path,
            out,
            max_depth,
        } => cmd_build(&path, out, max_depth),
        Command::Check {
            path,
            format,
            max_depth,
        } => cmd_check(&path, format, max_depth),
        Command::Tags => {
            print!("{}", describe_schema(Schema::builtin()));
            Ok(true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    if !path.exists() {
        return Err(CliError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn compile(source: &str, max_depth: usize) -> CompilerOutput {
    Compiler::new()
        .options(CompileOptions { max_depth })
        .process(source)
}

fn print_diagnostics(source: &str, output: &CompilerOutput) {
    for error in &output.errors {
        eprintln!("{}\n", format_error(source, error));
    }
}

/// Returns `Ok(false)` when the document has a syntax error.
fn cmd_build(path: &Path, out: Option<PathBuf>, max_depth: usize) -> Result<bool, CliError> {
    let source = read_source(path)?;
    let output = compile(&source, max_depth);
    print_diagnostics(&source, &output);

    let Some(body) = &output.html else {
        return Ok(false);
    };

    let out = match out {
        Some(out) => out,
        None => output_path(path)?,
    };
    let title = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("deskml");
    let page = deskml_codegen::html::standalone_page(title, body);

    std::fs::write(&out, page).map_err(|source| CliError::Write {
        path: out.clone(),
        source,
    })?;

    if !output.errors.is_empty() {
        log::warn!("built with {} diagnostics", output.errors.len());
    }
    eprintln!("Built: {}", out.display());
    Ok(true)
}

/// Returns `Ok(false)` when any diagnostic was reported.
fn cmd_check(path: &Path, format: Format, max_depth: usize) -> Result<bool, CliError> {
    let source = read_source(path)?;
    let output = compile(&source, max_depth);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&output.errors)?),
        Format::Text => {
            print_diagnostics(&source, &output);
            if output.errors.is_empty() {
                eprintln!("OK: {}", path.display());
            }
        }
    }

    Ok(output.errors.is_empty())
}

/// `page.dml` becomes `page.html` in the same directory.
fn output_path(path: &Path) -> Result<PathBuf, CliError> {
    if path.file_stem().is_none() {
        return Err(CliError::OutputName(path.to_path_buf()));
    }
    Ok(path.with_extension("html"))
}

fn describe_schema(schema: &Schema) -> String {
    let mut out = String::new();
    for (name, definition) in schema.iter() {
        out.push_str(&describe_tag(name, definition));
        out.push('\n');
    }
    out
}

fn describe_tag(name: &str, definition: &TagDefinition) -> String {
    let attrs: Vec<String> = definition
        .attrs
        .iter()
        .map(|(key, attr)| {
            let required = if attr.required { " (required)" } else { "" };
            format!("{key}: {}{required}", attr.attr_type)
        })
        .collect();
    let text = if definition.allows_text { "text" } else { "no text" };
    format!("<{name}> [{text}] {{{}}}", attrs.join(", "))
}
