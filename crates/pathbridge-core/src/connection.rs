use crate::error::CoreError;
use crate::mapping::mappings_for;
use crate::normalize::{normalize, normalize_remote, NormalizedPath};
use pathbridge_config::{AppConfig, ConnectionConfig, PathMappingConfig};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathMapping {
    pub local_prefix: String,
    pub remote_prefix: String,
}

impl PathMapping {
    pub fn new(local_prefix: impl Into<String>, remote_prefix: impl Into<String>) -> Self {
        Self {
            local_prefix: local_prefix.into(),
            remote_prefix: remote_prefix.into(),
        }
    }
}

impl From<&PathMappingConfig> for PathMapping {
    fn from(cfg: &PathMappingConfig) -> Self {
        Self::new(cfg.local_prefix.clone(), cfg.remote_prefix.clone())
    }
}

/// Read-only view of one configured remote endpoint. Built from the
/// configuration snapshot and handed to the core for a single call.
///
/// Prefixes are normalized once, when the connection is built; lookups
/// reuse them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub name: String,
    mappings: Vec<PathMapping>,
    /// Deprecated single mapping; appended after `mappings`.
    legacy_mapping: Option<PathMapping>,
    normalized: Vec<NormalizedMapping>,
}

/// Normalized prefixes of one usable mapping. `position` indexes
/// `mappings_for` order, unusable entries included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NormalizedMapping {
    pub(crate) position: usize,
    pub(crate) local: NormalizedPath,
    pub(crate) remote: NormalizedPath,
}

impl Connection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mappings: Vec::new(),
            legacy_mapping: None,
            normalized: Vec::new(),
        }
    }

    pub fn with_mapping(mut self, local_prefix: &str, remote_prefix: &str) -> Self {
        self.mappings.push(PathMapping::new(local_prefix, remote_prefix));
        self.reindex();
        self
    }

    pub fn with_legacy_mapping(mut self, local_prefix: &str, remote_prefix: &str) -> Self {
        self.legacy_mapping = Some(PathMapping::new(local_prefix, remote_prefix));
        self.reindex();
        self
    }

    pub fn mappings(&self) -> &[PathMapping] {
        &self.mappings
    }

    pub fn legacy_mapping(&self) -> Option<&PathMapping> {
        self.legacy_mapping.as_ref()
    }

    pub(crate) fn normalized(&self) -> &[NormalizedMapping] {
        &self.normalized
    }

    fn reindex(&mut self) {
        let mut normalized = Vec::new();
        for (position, mapping) in mappings_for(self).into_iter().enumerate() {
            let local = normalize(mapping.local_prefix.trim());
            let remote = normalize_remote(mapping.remote_prefix.trim());
            if local.is_empty() || remote.is_empty() {
                debug!(
                    connection = %self.name,
                    position,
                    "ignoring path mapping with an empty prefix"
                );
                continue;
            }
            normalized.push(NormalizedMapping {
                position,
                local,
                remote,
            });
        }
        self.normalized = normalized;
    }
}

impl From<&ConnectionConfig> for Connection {
    fn from(cfg: &ConnectionConfig) -> Self {
        let legacy_mapping = cfg.smb_mapping.as_ref().map(PathMapping::from);
        if let Some(legacy) = &legacy_mapping {
            info!(
                connection = %cfg.name,
                local_prefix = %legacy.local_prefix,
                remote_prefix = %legacy.remote_prefix,
                "connection uses deprecated smb_mapping; move it into path_mappings"
            );
        }
        let mut conn = Self {
            name: cfg.name.clone(),
            mappings: cfg.path_mappings.iter().map(PathMapping::from).collect(),
            legacy_mapping,
            normalized: Vec::new(),
        };
        conn.reindex();
        conn
    }
}

/// Snapshot of every configured connection, in declaration order.
pub fn connections_from_config(cfg: &AppConfig) -> Vec<Connection> {
    cfg.connections.iter().map(Connection::from).collect()
}

pub fn find_connection<'a>(
    connections: &'a [Connection],
    name: &str,
) -> Result<&'a Connection, CoreError> {
    connections
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| CoreError::UnknownConnection(name.to_string()))
}
