use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "streamdemux")]
#[command(author, version, about = "Incremental Matroska, WebM and MP4 demuxer")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the container of a media file and display its media info
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Demux a file in chunks and summarize the samples of each track
    Demux {
        /// File to demux
        #[arg(required = true)]
        file: PathBuf,

        /// Bytes appended per delivery
        #[arg(long, default_value = "65536")]
        chunk_size: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-mux a WebM or Matroska file into a fresh WebM stream
    Remux {
        /// Input file
        #[arg(required = true)]
        input: PathBuf,

        /// Where to write the re-muxed stream
        #[arg(short, long)]
        output: PathBuf,

        /// Bytes appended per delivery
        #[arg(long, default_value = "65536")]
        chunk_size: usize,
    },

    /// Validate a configuration file
    CheckConfig {
        /// Config file to validate
        file: PathBuf,
    },
}
