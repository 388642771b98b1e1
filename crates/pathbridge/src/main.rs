mod host;

use anyhow::{bail, Context, Result};
use clap::Parser;
use host::{LocalFileProbe, TerminalEditor};
use pathbridge_cli::{Cli, Command};
use pathbridge_config::{AppConfig, AppConfigLayer, AppPaths, ConfigManager, LoggingConfigLayer};
use pathbridge_core::{
    connections_from_config, dedup_overlapping, find_connection, find_mapping_for_local_path,
    mappings_for, normalize, normalize_remote, try_to_local, try_to_remote, Connection,
    ResolutionPipeline, ResolveContext, Scanner,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::new()?;
    let config_manager = ConfigManager::new(paths.clone());
    let overrides = cli.log_level.clone().map(|level| AppConfigLayer {
        logging: Some(LoggingConfigLayer {
            level: Some(level),
            ..Default::default()
        }),
        ..Default::default()
    });
    let config = config_manager.load(
        std::env::current_dir().ok().as_deref(),
        cli.config.as_deref(),
        overrides,
    )?;
    let _log_guard = init_logging(&config, &paths)?;
    info!(command = ?cli.command, "starting");

    match cli.command {
        Command::Connections => list_connections(&config),
        Command::ToRemote { path, connection } => {
            let connections = connections_from_config(&config);
            let owner = match connection {
                Some(name) => find_connection(&connections, &name)?,
                None => match find_mapping_for_local_path(&path, &connections) {
                    Some(found) => found.connection,
                    None => bail!("no connection maps {path}"),
                },
            };
            let remote = try_to_remote(&path, owner)?;
            println!("{}", normalize_remote(&remote).fs_path());
        }
        Command::ToLocal { path, connection } => {
            let connections = connections_from_config(&config);
            let owner = find_connection(&connections, &connection)?;
            let local = try_to_local(&path, owner)?;
            println!("{}", normalize(&local).fs_path());
        }
        Command::Scan { file, json } => {
            let text = read_input(file.as_deref()).await?;
            let scanner = Scanner::from_names(config.links.grammars.as_slice())?;
            let references = scanner.scan(&text);
            if json {
                println!("{}", serde_json::to_string_pretty(&references)?);
            } else {
                for r in &references {
                    println!(
                        "{}\t{}\t{}",
                        r.grammar,
                        &text[r.span()],
                        r.raw_path
                    );
                }
            }
        }
        Command::Open {
            connection,
            cwd,
            workspace,
            index,
            text,
        } => {
            // Prompts share stdin, so they only work when the text is an argument.
            let (text, editor) = match text {
                Some(text) => (text, TerminalEditor::new()),
                None => (read_input(None).await?, TerminalEditor::without_prompts()),
            };
            let connections = connections_from_config(&config);
            let owner = find_connection(&connections, &connection)?;
            open_references(&config, owner, &text, cwd, workspace, index, editor).await?;
        }
        Command::Config { init } => {
            if init {
                config_manager.save_default()?;
                println!("config initialized at {}", paths.config_file.display());
            } else {
                println!("{}", paths.config_file.display());
            }
        }
    }

    Ok(())
}

fn list_connections(config: &AppConfig) {
    if config.connections.is_empty() {
        println!("no connections configured");
        return;
    }
    for cfg in &config.connections {
        let conn = Connection::from(cfg);
        println!("{}", conn.name);
        let mappings = mappings_for(&conn);
        if mappings.is_empty() {
            println!("  (no path mappings)");
        }
        for (idx, mapping) in mappings.iter().enumerate() {
            let legacy = if idx >= conn.mappings().len() {
                " (smb_mapping)"
            } else {
                ""
            };
            println!(
                "  {} -> {}{legacy}",
                mapping.local_prefix, mapping.remote_prefix
            );
        }
        for cmd in &cfg.commands {
            match &cmd.description {
                Some(desc) => println!("  command {}: {} ({desc})", cmd.name, cmd.command),
                None => println!("  command {}: {}", cmd.name, cmd.command),
            }
        }
    }
}

async fn open_references(
    config: &AppConfig,
    connection: &Connection,
    text: &str,
    cwd: Option<String>,
    workspace: Option<String>,
    index: Option<usize>,
    editor: TerminalEditor,
) -> Result<()> {
    let scanner = Scanner::from_names(config.links.grammars.as_slice())?;
    let mut references = dedup_overlapping(scanner.scan(text));
    if let Some(idx) = index {
        if idx >= references.len() {
            bail!("reference {idx} out of range, found {}", references.len());
        }
        references = vec![references.swap_remove(idx)];
    }
    if references.is_empty() {
        println!("no references found");
        return Ok(());
    }

    let mut ctx = ResolveContext::new(cwd, workspace);
    ctx.workspace_fallback = config.links.workspace_fallback;
    let pipeline = ResolutionPipeline::new(Arc::new(LocalFileProbe), Arc::new(editor));

    for reference in &references {
        let result = pipeline.resolve(reference, connection, &ctx).await;
        if let Some(err) = &result.error {
            println!("  {}: {err}", reference.raw_path);
        }
    }
    Ok(())
}

async fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        }
    }
}

fn init_logging(
    config: &AppConfig,
    paths: &AppPaths,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(&paths.log_dir)?;
    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("pathbridge")
        .filename_suffix("log")
        .max_log_files(config.logging.file_max_count.max(1))
        .build(&paths.log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let file_layer = if config.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed()
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    // Console logs go to stderr; stdout carries command output.
    if config.logging.stdout {
        let console_layer = if config.logging.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };
        tracing::subscriber::set_global_default(subscriber.with(console_layer))?;
    } else {
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(guard)
}
