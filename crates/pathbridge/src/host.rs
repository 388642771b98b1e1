//! Local implementations of the resolution collaborators: a filesystem
//! probe over `tokio::fs` and an editor host that reports to the terminal.

use async_trait::async_trait;
use pathbridge_core::{CursorPosition, DirectoryAction, EditorHost, FileProbe, PathKind};
use std::io::ErrorKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

pub struct LocalFileProbe;

#[async_trait]
impl FileProbe for LocalFileProbe {
    async fn probe(&self, path: &str) -> std::io::Result<Option<PathKind>> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(PathKind::Directory)),
            Ok(_) => Ok(Some(PathKind::File)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Prints every decision and asks on stdin when a directory needs one.
/// One line is read per prompt from a reader shared by all prompts.
pub struct TerminalEditor<R = BufReader<Stdin>> {
    /// `None` when stdin already carried the scanned text.
    input: Option<Mutex<Lines<R>>>,
}

impl TerminalEditor {
    pub fn new() -> Self {
        Self::with_input(BufReader::new(tokio::io::stdin()))
    }

    pub fn without_prompts() -> Self {
        Self { input: None }
    }
}

impl Default for TerminalEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin> TerminalEditor<R> {
    pub fn with_input(reader: R) -> Self {
        Self {
            input: Some(Mutex::new(reader.lines())),
        }
    }
}

#[async_trait]
impl<R> EditorHost for TerminalEditor<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn open_at_position(&self, path: &str, position: CursorPosition) -> bool {
        println!("open {}", format_location(path, position));
        true
    }

    async fn reveal_directory(&self, path: &str) {
        println!("reveal {path}");
    }

    async fn prompt_directory_action(&self, path: &str) -> Option<DirectoryAction> {
        let Some(input) = &self.input else {
            println!("{path} is a directory outside the workspace; stdin held the text, so no action can be chosen");
            return None;
        };

        println!("{path} is a directory outside the workspace:");
        for (idx, action) in DirectoryAction::ALL.iter().enumerate() {
            println!("  {}) {}", idx + 1, action.label());
        }
        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"choice: ").await.ok()?;
        stdout.flush().await.ok()?;

        let line = input.lock().await.next_line().await.ok().flatten();
        match line {
            Some(line) => parse_choice(&line),
            None => {
                println!();
                None
            }
        }
    }

    async fn run_directory_action(&self, action: DirectoryAction, path: &str) {
        println!("{}: {path}", action.label());
    }

    async fn search_by_name(&self, file_name: &str, position: CursorPosition) {
        println!("search {}", format_location(file_name, position));
    }
}

/// `path[:line[:column]]` with the column back in 1-based form.
pub fn format_location(path: &str, position: CursorPosition) -> String {
    match (position.line, position.column) {
        (Some(line), Some(column)) => format!("{path}:{line}:{}", column + 1),
        (Some(line), None) => format!("{path}:{line}"),
        _ => path.to_string(),
    }
}

fn parse_choice(input: &str) -> Option<DirectoryAction> {
    let idx: usize = input.trim().parse().ok()?;
    DirectoryAction::ALL.get(idx.checked_sub(1)?).copied()
}
