use crate::connection::Connection;
use crate::mapping::MappingTable;
use crate::normalize::{collapse_separators, normalize, normalize_remote};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("connection `{connection}` has no usable path mappings")]
    NoMappingConfigured { connection: String },
    #[error("`{path}` is not under any path mapping of connection `{connection}`")]
    NoPrefixMatch { connection: String, path: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    ToRemote,
    ToLocal,
}

/// Translate a local path to the remote side, first matching mapping wins.
pub fn to_remote(local_path: &str, connection: &Connection) -> Option<String> {
    try_to_remote(local_path, connection).ok()
}

/// Translate a remote path to the local side, first matching mapping wins.
pub fn to_local(remote_path: &str, connection: &Connection) -> Option<String> {
    try_to_local(remote_path, connection).ok()
}

pub fn try_to_remote(local_path: &str, connection: &Connection) -> Result<String, TranslateError> {
    translate(local_path, &MappingTable::for_connection(connection), Direction::ToRemote)
}

pub fn try_to_local(remote_path: &str, connection: &Connection) -> Result<String, TranslateError> {
    translate(remote_path, &MappingTable::for_connection(connection), Direction::ToLocal)
}

pub fn translate(
    path: &str,
    table: &MappingTable<'_>,
    direction: Direction,
) -> Result<String, TranslateError> {
    let connection = &table.connection().name;
    if table.is_empty() {
        return Err(TranslateError::NoMappingConfigured {
            connection: connection.clone(),
        });
    }
    translate_with(table, path, direction).ok_or_else(|| TranslateError::NoPrefixMatch {
        connection: connection.clone(),
        path: path.to_string(),
    })
}

/// Prefix substitution over an already normalized table. Results are in
/// normalized form, trailing separator included.
pub fn translate_with(table: &MappingTable<'_>, path: &str, direction: Direction) -> Option<String> {
    let input = match direction {
        Direction::ToRemote => normalize(path),
        Direction::ToLocal => normalize_remote(path),
    };
    if input.is_empty() {
        return None;
    }

    for entry in table.entries() {
        let (from, to) = match direction {
            Direction::ToRemote => (entry.local, entry.remote),
            Direction::ToLocal => (entry.remote, entry.local),
        };

        if let (Some(have), Some(want)) = (input.drive_letter(), from.drive_letter()) {
            if have != want {
                debug!(position = entry.position, %have, %want, "drive letter mismatch, skipping mapping");
                continue;
            }
        }

        let Some(rest) = input.as_str().strip_prefix(from.as_str()) else {
            continue;
        };
        let remainder = rest.trim_start_matches('/');
        let translated = join_prefix(to.as_str(), remainder);
        debug!(
            connection = %table.connection().name,
            position = entry.position,
            ?direction,
            from = %input,
            to = %translated,
            "path translated"
        );
        return Some(translated);
    }

    None
}

fn join_prefix(prefix: &str, remainder: &str) -> String {
    let joined = format!("{}/{}", prefix.trim_end_matches('/'), remainder);
    let collapsed = collapse_separators(&joined);
    if collapsed == "/" || collapsed == "/./" {
        "/".to_string()
    } else {
        collapsed
    }
}
