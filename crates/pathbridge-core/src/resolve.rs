//! Turning a scanned reference into something the editor can act on.
//!
//! The pipeline translates the reference to local candidates, probes them in
//! order and ends in exactly one [`ResolutionAction`]. It never fails: every
//! problem degrades to a filename search or a cancelled prompt, with the
//! reason kept in [`ResolutionResult::error`].

use crate::connection::Connection;
use crate::mapping::MappingTable;
use crate::normalize::{fs_path, join_lexically, normalize};
use crate::scanner::PathReference;
use crate::translate::{translate, Direction, TranslateError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

/// Cursor placement handed to the editor: 1-based line, 0-based column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorPosition {
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl CursorPosition {
    /// Tools report 1-based columns; the cursor wants 0-based.
    pub fn from_reference(reference: &PathReference) -> Self {
        Self {
            line: reference.line,
            column: reference.column.map(|c| c.saturating_sub(1)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectoryAction {
    OpenHere,
    OpenInNewWindow,
    AddToWorkspace,
    RevealInOs,
}

impl DirectoryAction {
    pub const ALL: [DirectoryAction; 4] = [
        DirectoryAction::OpenHere,
        DirectoryAction::OpenInNewWindow,
        DirectoryAction::AddToWorkspace,
        DirectoryAction::RevealInOs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DirectoryAction::OpenHere => "Open folder",
            DirectoryAction::OpenInNewWindow => "Open folder in new window",
            DirectoryAction::AddToWorkspace => "Add folder to workspace",
            DirectoryAction::RevealInOs => "Reveal in file browser",
        }
    }
}

#[async_trait]
pub trait FileProbe: Send + Sync {
    /// `Ok(None)` when nothing exists at `path`.
    async fn probe(&self, path: &str) -> std::io::Result<Option<PathKind>>;
}

#[async_trait]
pub trait EditorHost: Send + Sync {
    /// Returns whether the editor accepted the open.
    async fn open_at_position(&self, path: &str, position: CursorPosition) -> bool;
    async fn reveal_directory(&self, path: &str);
    /// `None` when the user dismissed the prompt.
    async fn prompt_directory_action(&self, path: &str) -> Option<DirectoryAction>;
    async fn run_directory_action(&self, action: DirectoryAction, path: &str);
    async fn search_by_name(&self, file_name: &str, position: CursorPosition);
}

/// Per-call snapshot of the session state the pipeline needs.
#[derive(Clone, Debug)]
pub struct ResolveContext {
    pub remote_cwd: Option<String>,
    pub workspace_root: Option<String>,
    pub workspace_fallback: bool,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self {
            remote_cwd: None,
            workspace_root: None,
            workspace_fallback: true,
        }
    }
}

impl ResolveContext {
    pub fn new(remote_cwd: Option<String>, workspace_root: Option<String>) -> Self {
        Self {
            remote_cwd: remote_cwd.filter(|s| !s.trim().is_empty()),
            workspace_root: workspace_root.filter(|s| !s.trim().is_empty()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveErrorKind {
    #[error("connection has no usable path mappings")]
    NoMappingConfigured,
    #[error("path is not under any mapping")]
    NoPrefixMatch,
    #[error("target not found: {path}")]
    TargetNotFound { path: String },
    #[error("directory outside the workspace: {path}")]
    AmbiguousDirectory { path: String },
    #[error("cannot access {path}: {message}")]
    FilesystemAccessError { path: String, message: String },
    #[error("editor declined to open {path}")]
    OpenRejected { path: String },
}

impl From<TranslateError> for ResolveErrorKind {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::NoMappingConfigured { .. } => ResolveErrorKind::NoMappingConfigured,
            TranslateError::NoPrefixMatch { .. } => ResolveErrorKind::NoPrefixMatch,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionAction {
    OpenFile {
        path: String,
        position: CursorPosition,
    },
    RevealDirectory {
        path: String,
    },
    Directory {
        action: DirectoryAction,
        path: String,
    },
    Search {
        file_name: String,
        position: CursorPosition,
    },
    PromptCancelled {
        path: String,
    },
}

#[derive(Clone, Debug)]
pub struct ResolutionResult {
    pub success: bool,
    pub action: ResolutionAction,
    pub reference: PathReference,
    pub error: Option<ResolveErrorKind>,
}

#[derive(Clone)]
pub struct ResolutionPipeline {
    probe: Arc<dyn FileProbe>,
    editor: Arc<dyn EditorHost>,
}

impl ResolutionPipeline {
    pub fn new(probe: Arc<dyn FileProbe>, editor: Arc<dyn EditorHost>) -> Self {
        Self { probe, editor }
    }

    pub async fn resolve(
        &self,
        reference: &PathReference,
        connection: &Connection,
        ctx: &ResolveContext,
    ) -> ResolutionResult {
        let (candidates, translate_error) = local_candidates(reference, connection, ctx);
        debug!(
            connection = %connection.name,
            raw_path = %reference.raw_path,
            candidates = ?candidates,
            "resolving reference"
        );

        let mut last_error = translate_error;
        for candidate in &candidates {
            match self.probe.probe(candidate).await {
                Ok(Some(kind)) => return self.on_existing(reference, candidate, kind, ctx).await,
                Ok(None) => {
                    last_error = Some(ResolveErrorKind::TargetNotFound {
                        path: candidate.clone(),
                    });
                }
                Err(err) => {
                    warn!(path = %candidate, error = %err, "existence check failed");
                    last_error = Some(ResolveErrorKind::FilesystemAccessError {
                        path: candidate.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        self.search(reference, last_error).await
    }

    async fn on_existing(
        &self,
        reference: &PathReference,
        path: &str,
        kind: PathKind,
        ctx: &ResolveContext,
    ) -> ResolutionResult {
        match kind {
            PathKind::File => {
                let position = CursorPosition::from_reference(reference);
                if self.editor.open_at_position(path, position).await {
                    info!(path, line = ?position.line, column = ?position.column, "opened file");
                    return finish(
                        reference,
                        true,
                        ResolutionAction::OpenFile {
                            path: path.to_string(),
                            position,
                        },
                        None,
                    );
                }
                warn!(path, "editor declined open, falling back to search");
                self.search(
                    reference,
                    Some(ResolveErrorKind::OpenRejected {
                        path: path.to_string(),
                    }),
                )
                .await
            }
            PathKind::Directory => {
                if is_inside_workspace(path, ctx) {
                    self.editor.reveal_directory(path).await;
                    info!(path, "revealed directory");
                    return finish(
                        reference,
                        true,
                        ResolutionAction::RevealDirectory {
                            path: path.to_string(),
                        },
                        None,
                    );
                }
                match self.editor.prompt_directory_action(path).await {
                    Some(action) => {
                        self.editor.run_directory_action(action, path).await;
                        info!(path, ?action, "directory action chosen");
                        finish(
                            reference,
                            true,
                            ResolutionAction::Directory {
                                action,
                                path: path.to_string(),
                            },
                            None,
                        )
                    }
                    None => {
                        info!(path, "directory prompt dismissed");
                        finish(
                            reference,
                            false,
                            ResolutionAction::PromptCancelled {
                                path: path.to_string(),
                            },
                            Some(ResolveErrorKind::AmbiguousDirectory {
                                path: path.to_string(),
                            }),
                        )
                    }
                }
            }
        }
    }

    async fn search(
        &self,
        reference: &PathReference,
        error: Option<ResolveErrorKind>,
    ) -> ResolutionResult {
        let file_name = reference.file_name().to_string();
        let position = CursorPosition::from_reference(reference);
        info!(file_name = %file_name, reason = ?error, "falling back to filename search");
        self.editor.search_by_name(&file_name, position).await;
        finish(
            reference,
            false,
            ResolutionAction::Search {
                file_name,
                position,
            },
            error,
        )
    }
}

fn finish(
    reference: &PathReference,
    success: bool,
    action: ResolutionAction,
    error: Option<ResolveErrorKind>,
) -> ResolutionResult {
    ResolutionResult {
        success,
        action,
        reference: reference.clone(),
        error,
    }
}

/// Local filesystem paths worth probing, best first, plus the translation
/// failure to report if none of them exists.
fn local_candidates(
    reference: &PathReference,
    connection: &Connection,
    ctx: &ResolveContext,
) -> (Vec<String>, Option<ResolveErrorKind>) {
    let table = MappingTable::for_connection(connection);
    let mut candidates = Vec::new();
    let mut error = None;

    let remote = if reference.is_absolute_style {
        Some(reference.raw_path.clone())
    } else if reference.is_relative_style {
        ctx.remote_cwd
            .as_deref()
            .map(|cwd| join_lexically(cwd, &reference.raw_path))
    } else {
        None
    };

    match remote {
        Some(remote) => match translate(&remote, &table, Direction::ToLocal) {
            Ok(local) => candidates.push(fs_path(&local).to_string()),
            Err(err) => error = Some(ResolveErrorKind::from(err)),
        },
        None if table.is_empty() => error = Some(ResolveErrorKind::NoMappingConfigured),
        None => error = Some(ResolveErrorKind::NoPrefixMatch),
    }

    if reference.is_relative_style && ctx.workspace_fallback {
        if let Some(root) = &ctx.workspace_root {
            let local = join_lexically(normalize(root).fs_path(), &reference.raw_path);
            if !candidates.contains(&local) {
                candidates.push(local);
            }
        }
    }

    (candidates, error)
}

fn is_inside_workspace(path: &str, ctx: &ResolveContext) -> bool {
    ctx.workspace_root
        .as_deref()
        .is_some_and(|root| normalize(path).starts_with(&normalize(root)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProbe {
        entries: HashMap<String, PathKind>,
        broken: Vec<String>,
        probed: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn with(mut self, path: &str, kind: PathKind) -> Self {
            self.entries.insert(path.to_string(), kind);
            self
        }
    }

    #[async_trait]
    impl FileProbe for FakeProbe {
        async fn probe(&self, path: &str) -> std::io::Result<Option<PathKind>> {
            self.probed.lock().unwrap().push(path.to_string());
            if self.broken.iter().any(|b| b == path) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "denied",
                ));
            }
            Ok(self.entries.get(path).copied())
        }
    }

    #[derive(Default)]
    struct FakeEditor {
        accept_open: bool,
        choice: Option<DirectoryAction>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeEditor {
        fn accepting() -> Self {
            Self {
                accept_open: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EditorHost for FakeEditor {
        async fn open_at_position(&self, path: &str, position: CursorPosition) -> bool {
            self.calls
                .lock()
                .unwrap()
                .push(format!("open {path} {:?} {:?}", position.line, position.column));
            self.accept_open
        }

        async fn reveal_directory(&self, path: &str) {
            self.calls.lock().unwrap().push(format!("reveal {path}"));
        }

        async fn prompt_directory_action(&self, path: &str) -> Option<DirectoryAction> {
            self.calls.lock().unwrap().push(format!("prompt {path}"));
            self.choice
        }

        async fn run_directory_action(&self, action: DirectoryAction, path: &str) {
            self.calls.lock().unwrap().push(format!("{action:?} {path}"));
        }

        async fn search_by_name(&self, file_name: &str, position: CursorPosition) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("search {file_name} {:?}", position.line));
        }
    }

    fn projects() -> Connection {
        Connection::new("dev").with_mapping("C:/Projects", "/home/u")
    }

    fn pipeline(probe: FakeProbe, editor: FakeEditor) -> (ResolutionPipeline, Arc<FakeProbe>, Arc<FakeEditor>) {
        let probe = Arc::new(probe);
        let editor = Arc::new(editor);
        (
            ResolutionPipeline::new(probe.clone(), editor.clone()),
            probe,
            editor,
        )
    }

    fn only_reference(text: &str) -> PathReference {
        let refs = scan(text);
        assert_eq!(refs.len(), 1, "{refs:?}");
        refs.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn end_to_end_opens_translated_file() {
        let probe = FakeProbe::default().with("C:/Projects/app.js", PathKind::File);
        let (pipeline, _, editor) = pipeline(probe, FakeEditor::accepting());
        let reference = only_reference("/home/u/app.js:5");

        let result = pipeline
            .resolve(&reference, &projects(), &ResolveContext::default())
            .await;

        assert!(result.success);
        assert_eq!(
            result.action,
            ResolutionAction::OpenFile {
                path: "C:/Projects/app.js".to_string(),
                position: CursorPosition {
                    line: Some(5),
                    column: None
                },
            }
        );
        assert_eq!(editor.calls(), vec!["open C:/Projects/app.js Some(5) None"]);
    }

    #[tokio::test]
    async fn column_is_converted_to_zero_based() {
        let probe = FakeProbe::default().with("C:/Projects/src/lib.rs", PathKind::File);
        let (pipeline, _, _) = pipeline(probe, FakeEditor::accepting());
        let reference = only_reference("/home/u/src/lib.rs:10:1");

        let result = pipeline
            .resolve(&reference, &projects(), &ResolveContext::default())
            .await;
        assert!(matches!(
            result.action,
            ResolutionAction::OpenFile { position: CursorPosition { line: Some(10), column: Some(0) }, .. }
        ));
    }

    #[tokio::test]
    async fn missing_target_falls_back_to_search() {
        let (pipeline, _, editor) = pipeline(FakeProbe::default(), FakeEditor::accepting());
        let reference = only_reference("/home/u/gone.c:3");

        let result = pipeline
            .resolve(&reference, &projects(), &ResolveContext::default())
            .await;

        assert!(!result.success);
        assert!(matches!(
            &result.action,
            ResolutionAction::Search { file_name, .. } if file_name == "gone.c"
        ));
        assert_eq!(
            result.error,
            Some(ResolveErrorKind::TargetNotFound {
                path: "C:/Projects/gone.c".to_string()
            })
        );
        assert_eq!(editor.calls(), vec!["search gone.c Some(3)"]);
    }

    #[tokio::test]
    async fn unmapped_path_searches_without_probing() {
        let (pipeline, probe, _) = pipeline(FakeProbe::default(), FakeEditor::accepting());
        let reference = only_reference("/opt/other/x.h");

        let result = pipeline
            .resolve(&reference, &projects(), &ResolveContext::default())
            .await;
        assert_eq!(result.error, Some(ResolveErrorKind::NoPrefixMatch));
        assert!(matches!(result.action, ResolutionAction::Search { .. }));
        assert!(probe.probed.lock().unwrap().is_empty());

        let result = pipeline
            .resolve(&reference, &Connection::new("bare"), &ResolveContext::default())
            .await;
        assert_eq!(result.error, Some(ResolveErrorKind::NoMappingConfigured));
    }

    #[tokio::test]
    async fn filesystem_errors_degrade_to_search() {
        let probe = FakeProbe {
            broken: vec!["C:/Projects/locked.txt".to_string()],
            ..Default::default()
        };
        let (pipeline, _, _) = pipeline(probe, FakeEditor::accepting());
        let reference = only_reference("/home/u/locked.txt");

        let result = pipeline
            .resolve(&reference, &projects(), &ResolveContext::default())
            .await;
        assert!(matches!(result.action, ResolutionAction::Search { .. }));
        assert!(matches!(
            result.error,
            Some(ResolveErrorKind::FilesystemAccessError { .. })
        ));
    }

    #[tokio::test]
    async fn relative_reference_uses_remote_cwd() {
        let probe = FakeProbe::default().with("C:/Projects/app/src/main.c", PathKind::File);
        let (pipeline, _, _) = pipeline(probe, FakeEditor::accepting());
        let reference = only_reference("./src/main.c:7");
        let ctx = ResolveContext::new(Some("/home/u/app/build/..".to_string()), None);

        let result = pipeline.resolve(&reference, &projects(), &ctx).await;
        assert!(result.success);
        assert!(matches!(
            &result.action,
            ResolutionAction::OpenFile { path, .. } if path == "C:/Projects/app/src/main.c"
        ));
    }

    #[tokio::test]
    async fn relative_reference_falls_back_to_workspace_root() {
        let probe = FakeProbe::default().with("D:/ws/lib/util.h", PathKind::File);
        let (pipeline, probe, _) = pipeline(probe, FakeEditor::accepting());
        let reference = only_reference("../lib/util.h:2");
        let ctx = ResolveContext::new(Some("/var/tmp".to_string()), Some("d:\\ws\\build".to_string()));

        let result = pipeline.resolve(&reference, &projects(), &ctx).await;
        assert!(result.success, "{result:?}");
        assert_eq!(*probe.probed.lock().unwrap(), vec!["D:/ws/lib/util.h"]);

        let no_fallback = ResolveContext {
            workspace_fallback: false,
            ..ctx
        };
        let result = pipeline.resolve(&reference, &projects(), &no_fallback).await;
        assert!(matches!(result.action, ResolutionAction::Search { .. }));
        assert_eq!(result.error, Some(ResolveErrorKind::NoPrefixMatch));
    }

    #[tokio::test]
    async fn bare_compiler_reference_is_relative() {
        let probe = FakeProbe::default().with("C:/Projects/app.cpp", PathKind::File);
        let (pipeline, _, _) = pipeline(probe, FakeEditor::accepting());
        let reference = only_reference("app.cpp:42:15: error: x");
        let ctx = ResolveContext::new(Some("/home/u".to_string()), None);

        let result = pipeline.resolve(&reference, &projects(), &ctx).await;
        assert!(matches!(
            result.action,
            ResolutionAction::OpenFile { position: CursorPosition { line: Some(42), column: Some(14) }, .. }
        ));
    }

    #[tokio::test]
    async fn directory_inside_workspace_is_revealed() {
        let probe = FakeProbe::default().with("C:/Projects/src", PathKind::Directory);
        let (pipeline, _, editor) = pipeline(probe, FakeEditor::accepting());
        let reference = only_reference("/home/u/src");
        let ctx = ResolveContext::new(None, Some("c:\\Projects".to_string()));

        let result = pipeline.resolve(&reference, &projects(), &ctx).await;
        assert!(result.success);
        assert_eq!(
            result.action,
            ResolutionAction::RevealDirectory {
                path: "C:/Projects/src".to_string()
            }
        );
        assert_eq!(editor.calls(), vec!["reveal C:/Projects/src"]);
    }

    #[tokio::test]
    async fn directory_outside_workspace_prompts() {
        let probe = FakeProbe::default().with("C:/Projects/lib", PathKind::Directory);
        let editor = FakeEditor {
            choice: Some(DirectoryAction::AddToWorkspace),
            ..FakeEditor::accepting()
        };
        let (pipeline, _, editor) = pipeline(probe, editor);
        let reference = only_reference("/home/u/lib");
        let ctx = ResolveContext::new(None, Some("E:/elsewhere".to_string()));

        let result = pipeline.resolve(&reference, &projects(), &ctx).await;
        assert!(result.success);
        assert_eq!(
            result.action,
            ResolutionAction::Directory {
                action: DirectoryAction::AddToWorkspace,
                path: "C:/Projects/lib".to_string()
            }
        );
        assert_eq!(
            editor.calls(),
            vec!["prompt C:/Projects/lib", "AddToWorkspace C:/Projects/lib"]
        );
    }

    #[tokio::test]
    async fn dismissed_prompt_is_cancelled() {
        let probe = FakeProbe::default().with("C:/Projects/lib", PathKind::Directory);
        let (pipeline, _, _) = pipeline(probe, FakeEditor::accepting());
        let reference = only_reference("/home/u/lib");

        let result = pipeline
            .resolve(&reference, &projects(), &ResolveContext::default())
            .await;
        assert!(!result.success);
        assert_eq!(
            result.action,
            ResolutionAction::PromptCancelled {
                path: "C:/Projects/lib".to_string()
            }
        );
        assert_eq!(
            result.error,
            Some(ResolveErrorKind::AmbiguousDirectory {
                path: "C:/Projects/lib".to_string()
            })
        );
    }

    #[tokio::test]
    async fn rejected_open_falls_back_to_search() {
        let probe = FakeProbe::default().with("C:/Projects/app.js", PathKind::File);
        let (pipeline, _, editor) = pipeline(probe, FakeEditor::default());
        let reference = only_reference("/home/u/app.js:5");

        let result = pipeline
            .resolve(&reference, &projects(), &ResolveContext::default())
            .await;
        assert!(!result.success);
        assert!(matches!(result.action, ResolutionAction::Search { .. }));
        assert_eq!(
            result.error,
            Some(ResolveErrorKind::OpenRejected {
                path: "C:/Projects/app.js".to_string()
            })
        );
        assert_eq!(editor.calls().len(), 2);
    }
}
