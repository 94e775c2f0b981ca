//! tntscope - Tarantool protocol stream decoder
//!
//! Replays a captured IPROTO byte stream (one direction or both, as recorded)
//! through the passive decoder and prints one entry per packet.

mod config;
mod render;
mod replay;

use clap::Parser;
use colored::Colorize;
use config::{Config, OutputFormat};
use render::Renderer;
use replay::{replay, ReplayError};
use std::path::{Path, PathBuf};
use tntscope_protocol::StreamDecoder;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tntscope")]
#[command(about = "Decode a captured Tarantool binary protocol stream")]
#[command(version)]
struct Cli {
    /// Captured byte stream (reads stdin if omitted)
    input: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long, env = "TNTSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Bytes handed to the decoder per delivery
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Nesting depth past which values render as `...`
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(size) = self.chunk_size {
            config.input.chunk_size = size;
        }
        if let Some(depth) = self.max_depth {
            config.decoder.max_depth = depth;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.no_color {
            config.output.color = false;
        }
    }
}

async fn open_input(path: &Path) -> Result<tokio::fs::File, String> {
    tokio::fs::File::open(path)
        .await
        .map_err(|e| format!("{}: {}", path.display(), e))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(2);
        }
    };
    cli.apply(&mut config);

    if let Err(e) = config.validate() {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(2);
    }

    if !config.output.color || config.output.format == OutputFormat::Json {
        colored::control::set_override(false);
    }

    tracing::info!(
        chunk_size = config.input.chunk_size,
        max_depth = config.decoder.max_depth,
        format = ?config.output.format,
        "starting replay"
    );

    let mut decoder = StreamDecoder::with_options(config.decoder.format_options());
    let mut renderer = Renderer::new(config.output.format);
    let mut out = std::io::stdout().lock();
    let chunk_size = config.input.chunk_size;

    let result = match &cli.input {
        Some(path) => {
            let file = match open_input(path).await {
                Ok(file) => file,
                Err(message) => {
                    eprintln!("{}: {}", "Error".red(), message);
                    std::process::exit(1);
                }
            };
            replay(file, chunk_size, &mut decoder, &mut renderer, &mut out).await
        }
        None => {
            replay(
                tokio::io::stdin(),
                chunk_size,
                &mut decoder,
                &mut renderer,
                &mut out,
            )
            .await
        }
    };

    match result {
        Ok(stats) => {
            tracing::info!(
                packets = stats.packets,
                bytes = stats.bytes,
                reassembly_requests = stats.reassembly_requests,
                "replay finished"
            );
            if stats.truncated > 0 {
                eprintln!(
                    "{}: input ended inside a packet ({} byte(s) left undecoded)",
                    "Warning".yellow(),
                    stats.truncated
                );
            }
            Ok(())
        }
        Err(ReplayError::Protocol {
            position,
            decoded,
            source,
        }) => {
            eprintln!(
                "{}: {} at stream offset {} after {} packet(s)",
                "Malformed stream".red(),
                source,
                position,
                decoded
            );
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        let message = open_input(&path).await.unwrap_err();
        assert!(message.starts_with(&path.display().to_string()));
        assert!(!message.contains("Os {"));
    }

    #[tokio::test]
    async fn test_open_existing_input() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(open_input(file.path()).await.is_ok());
    }
}
