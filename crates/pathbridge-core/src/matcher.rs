use crate::connection::{Connection, PathMapping};
use crate::mapping::MappingTable;
use crate::normalize::normalize;

#[derive(Clone, Copy, Debug)]
pub struct ConnectionMatch<'a> {
    pub connection: &'a Connection,
    pub mapping: &'a PathMapping,
    /// Length of the normalized local prefix that matched.
    pub prefix_len: usize,
}

/// Connection owning `path`: the one with the longest matching local
/// prefix across all connections. Ties go to the earliest declaration.
pub fn find_connection_for_local_path<'a>(
    path: &str,
    connections: &'a [Connection],
) -> Option<&'a Connection> {
    find_mapping_for_local_path(path, connections).map(|m| m.connection)
}

pub fn find_mapping_for_local_path<'a>(
    path: &str,
    connections: &'a [Connection],
) -> Option<ConnectionMatch<'a>> {
    let input = normalize(path);
    if input.is_empty() {
        return None;
    }

    let mut best: Option<ConnectionMatch<'a>> = None;
    for connection in connections {
        let table = MappingTable::for_connection(connection);
        for entry in table.entries() {
            if !input.starts_with(entry.local) {
                continue;
            }
            let prefix_len = entry.local.len();
            if best.map_or(true, |b| prefix_len > b.prefix_len) {
                best = Some(ConnectionMatch {
                    connection,
                    mapping: entry.mapping,
                    prefix_len,
                });
            }
        }
    }
    best
}
