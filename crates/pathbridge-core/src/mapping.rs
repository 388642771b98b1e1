use crate::connection::{Connection, PathMapping};
use crate::normalize::NormalizedPath;

/// Effective mappings of a connection: the declared list followed by the
/// deprecated single mapping, if any. Order is preserved and nothing is
/// deduplicated.
pub fn mappings_for(connection: &Connection) -> Vec<&PathMapping> {
    let mut out: Vec<&PathMapping> = connection.mappings().iter().collect();
    out.extend(connection.legacy_mapping());
    out
}

#[derive(Clone, Copy, Debug)]
pub struct MappingEntry<'a> {
    pub mapping: &'a PathMapping,
    pub local: &'a NormalizedPath,
    pub remote: &'a NormalizedPath,
    /// Position in `mappings_for` order, invalid entries included.
    pub position: usize,
}

/// Usable mappings of one connection, borrowing the prefixes the
/// connection normalized when it was built. Entries with an empty prefix on
/// either side are not present.
#[derive(Clone, Debug)]
pub struct MappingTable<'a> {
    connection: &'a Connection,
    entries: Vec<MappingEntry<'a>>,
}

impl<'a> MappingTable<'a> {
    pub fn for_connection(connection: &'a Connection) -> Self {
        let all = mappings_for(connection);
        let entries = connection
            .normalized()
            .iter()
            .map(|n| MappingEntry {
                mapping: all[n.position],
                local: &n.local,
                remote: &n.remote,
                position: n.position,
            })
            .collect();
        Self {
            connection,
            entries,
        }
    }

    pub fn connection(&self) -> &'a Connection {
        self.connection
    }

    pub fn entries(&self) -> &[MappingEntry<'a>] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
