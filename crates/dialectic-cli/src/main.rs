//! dialectic CLI
//!
//! Renders JSON query specifications to SQL, for golden-file tests and for
//! checking what a specification looks like on each backend.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use dialectic_core::dialect::DialectKind;
use dialectic_core::render::{RenderOptions, RenderedQuery};
use dialectic_core::sanitize::ValueMode;
use dialectic_core::spec::{DeleteSpec, InsertSpec, QuerySpec, UpdateSpec};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

/// Multi-dialect SQL rendering.
#[derive(Parser)]
#[command(name = "dialectic")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON specification.
    Render {
        /// Specification file; reads stdin when omitted.
        file: Option<PathBuf>,

        /// Target dialect.
        #[arg(short, long, env = "DIALECTIC_DIALECT", default_value = "sqlite")]
        dialect: DialectKind,

        /// Statement kind of the specification.
        #[arg(short, long, value_enum, default_value_t = Statement::Select)]
        statement: Statement,

        /// Inline values as literals instead of binding parameters.
        #[arg(long)]
        inline: bool,

        /// Overrides the dialect's IN-list threshold.
        #[arg(long)]
        threshold: Option<usize>,

        /// Print SQL and parameters as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the built-in dialects and their features.
    Dialects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Statement {
    Select,
    Insert,
    Update,
    Delete,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Render {
            file,
            dialect,
            statement,
            inline,
            threshold,
            json,
        } => {
            let input = match &file {
                Some(path) => fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let options = RenderOptions {
                dialect,
                mode: if inline {
                    ValueMode::Inline
                } else {
                    ValueMode::Parameterized
                },
                inline_list_threshold: threshold,
            };
            debug!(%dialect, ?statement, "rendering");
            let query = render_input(&input, statement, &options)?;
            println!("{}", format_output(&query, json)?);
        }

        Commands::Dialects => {
            for kind in DialectKind::ALL {
                println!("{}", describe(kind));
            }
        }
    }

    Ok(())
}

fn render_input(
    input: &str,
    statement: Statement,
    options: &RenderOptions,
) -> anyhow::Result<RenderedQuery> {
    let renderer = options.renderer();
    let query = match statement {
        Statement::Select => {
            let spec: QuerySpec = serde_json::from_str(input).context("parsing query spec")?;
            renderer.render(&spec)?
        }
        Statement::Insert => {
            let spec: InsertSpec = serde_json::from_str(input).context("parsing insert spec")?;
            renderer.render_insert(&spec)?
        }
        Statement::Update => {
            let spec: UpdateSpec = serde_json::from_str(input).context("parsing update spec")?;
            renderer.render_update(&spec)?
        }
        Statement::Delete => {
            let spec: DeleteSpec = serde_json::from_str(input).context("parsing delete spec")?;
            renderer.render_delete(&spec)?
        }
    };
    Ok(query)
}

fn format_output(query: &RenderedQuery, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(query)?);
    }
    let mut out = String::from(query.sql());
    for (i, param) in query.params().iter().enumerate() {
        out.push_str(&format!("\n-- {}: {}", i + 1, serde_json::to_string(param)?));
    }
    Ok(out)
}

fn describe(kind: DialectKind) -> String {
    let p = kind.profile();
    let flag = |on: bool, name: &str| if on { name.to_string() } else { format!("no {name}") };
    format!(
        "{:<11} {}",
        p.name,
        [
            flag(p.supports_window_functions, "windows"),
            flag(p.supports_cte, "cte"),
            flag(p.supports_intersect_except, "intersect/except"),
        ]
        .join(", ")
    )
}
