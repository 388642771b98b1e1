use serde::{Deserialize, Serialize};

/// One `local_prefix <-> remote_prefix` pair as written in the config file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathMappingConfig {
    #[serde(alias = "localPrefix", alias = "localPath")]
    pub local_prefix: String,
    #[serde(alias = "remotePrefix", alias = "remotePath")]
    pub remote_prefix: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub name: String,
    #[serde(default, alias = "pathMappings")]
    pub path_mappings: Vec<PathMappingConfig>,
    /// Deprecated single mapping, kept so older config files still load.
    #[serde(default, alias = "smbMapping", skip_serializing_if = "Option::is_none")]
    pub smb_mapping: Option<PathMappingConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandSpec>,
}

/// Raw command shape: either a bare command line or a described entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CommandEntry {
    Bare(String),
    Detailed {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// Normalized command record. Both raw shapes deserialize into this.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "CommandEntry", into = "CommandEntry")]
pub struct CommandSpec {
    pub command: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<CommandEntry> for CommandSpec {
    fn from(entry: CommandEntry) -> Self {
        match entry {
            CommandEntry::Bare(command) => Self {
                name: command.clone(),
                command,
                description: None,
            },
            CommandEntry::Detailed {
                command,
                name,
                description,
            } => Self {
                name: name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| command.clone()),
                command,
                description,
            },
        }
    }
}

impl From<CommandSpec> for CommandEntry {
    fn from(spec: CommandSpec) -> Self {
        if spec.description.is_none() && spec.name == spec.command {
            CommandEntry::Bare(spec.command)
        } else {
            CommandEntry::Detailed {
                command: spec.command,
                name: Some(spec.name),
                description: spec.description,
            }
        }
    }
}

impl ConnectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path_mappings: Vec::new(),
            smb_mapping: None,
            commands: Vec::new(),
        }
    }

    pub fn with_mapping(mut self, local_prefix: &str, remote_prefix: &str) -> Self {
        self.path_mappings.push(PathMappingConfig {
            local_prefix: local_prefix.to_string(),
            remote_prefix: remote_prefix.to_string(),
        });
        self
    }
}
