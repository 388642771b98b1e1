pub mod connection;
pub mod error;
pub mod mapping;
pub mod matcher;
pub mod normalize;
pub mod resolve;
pub mod scanner;
pub mod translate;

pub use connection::{connections_from_config, find_connection, Connection, PathMapping};
pub use error::CoreError;
pub use mapping::{mappings_for, MappingEntry, MappingTable};
pub use matcher::{find_connection_for_local_path, find_mapping_for_local_path, ConnectionMatch};
pub use normalize::{join_lexically, normalize, normalize_remote, NormalizedPath};
pub use resolve::{
    CursorPosition, DirectoryAction, EditorHost, FileProbe, PathKind, ResolutionAction,
    ResolutionPipeline, ResolutionResult, ResolveContext, ResolveErrorKind,
};
pub use scanner::{dedup_overlapping, scan, Grammar, PathReference, Scanner};
pub use translate::{
    to_local, to_remote, translate, translate_with, try_to_local, try_to_remote, Direction,
    TranslateError,
};
