use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pathbridge",
    version,
    about = "Map paths between a mounted share and its remote host"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Extra config file applied after the user and project files.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the configured log level.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List connections with their effective mappings and commands.
    Connections,
    /// Translate a local path to its remote form.
    ToRemote {
        path: String,
        /// Defaults to the connection owning the path.
        #[arg(long)]
        connection: Option<String>,
    },
    /// Translate a remote path to its local form.
    ToLocal {
        path: String,
        #[arg(long)]
        connection: String,
    },
    /// Print the file references found in stdin or a file.
    Scan {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Resolve the references found in text and act on them.
    ///
    /// Directories outside the workspace ask for an action on stdin, one
    /// line per prompt. When TEXT is read from stdin no prompt can be
    /// answered and those directories are left unopened.
    Open {
        #[arg(long)]
        connection: String,
        /// Remote working directory for relative references.
        #[arg(long)]
        cwd: Option<String>,
        /// Local workspace root.
        #[arg(long)]
        workspace: Option<String>,
        /// Only resolve the N-th reference, counting from 0.
        #[arg(long)]
        index: Option<usize>,
        /// Text to scan; read from stdin when omitted.
        text: Option<String>,
    },
    /// Show the user config file path, or create it.
    Config {
        /// Write a default config file.
        #[arg(long)]
        init: bool,
    },
}
