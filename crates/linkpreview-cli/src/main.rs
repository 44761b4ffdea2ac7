//! LinkPreview CLI - Command-line interface for extracting link previews

use clap::{Parser, ValueEnum};
use linkpreview::{Preview, Scraper, DEFAULT_MAX_REDIRECTS};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Output format for the preview
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// YAML-style frontmatter
    #[default]
    Md,
    /// JSON format
    Json,
}

/// LinkPreview - fetch a page and print its preview metadata
#[derive(Parser, Debug)]
#[command(name = "linkpreview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// URL to preview
    #[arg(required_unless_present = "schema")]
    url: Option<String>,

    /// Maximum number of redirects to follow
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
    max_redirects: usize,

    /// Output format
    #[arg(long, short, default_value = "md")]
    output: OutputFormat,

    /// Print the JSON schema of the preview record
    #[arg(long)]
    schema: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.schema {
        let schema = schemars::schema_for!(Preview);
        writeln_safe(&to_json_or_exit(&schema));
        std::process::exit(0);
    }

    if let Some(url) = cli.url {
        run_preview(&url, cli.max_redirects, cli.output).await;
    }
}

async fn run_preview(url: &str, max_redirects: usize, output: OutputFormat) {
    let result = match Scraper::new(url, max_redirects) {
        Ok(scraper) => scraper.fetch().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(doc) => match output {
            OutputFormat::Md => writeln_safe(&format_md_frontmatter(&doc.preview)),
            OutputFormat::Json => writeln_safe(&to_json_or_exit(&doc.preview)),
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn to_json_or_exit<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        std::process::exit(1);
    })
}

/// Format preview as YAML-style frontmatter, omitting empty fields
fn format_md_frontmatter(preview: &Preview) -> String {
    let mut output = String::new();

    output.push_str("---\n");
    output.push_str(&format!("link: {}\n", preview.link));
    for (key, value) in [
        ("title", &preview.title),
        ("name", &preview.name),
        ("description", &preview.description),
        ("icon", &preview.icon),
    ] {
        if !value.is_empty() {
            output.push_str(&format!("{}: {}\n", key, value));
        }
    }
    if !preview.images.is_empty() {
        output.push_str("images:\n");
        for image in &preview.images {
            output.push_str(&format!("  - {}\n", image));
        }
    }
    output.push_str("---");

    output
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
