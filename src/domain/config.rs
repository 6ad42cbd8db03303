use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{RelationKind, RelationVocabulary, history};

/// Configuration for the record store and the interchange codec.
///
/// Stored as TOML. Every field has a default, so an empty file (or no file at
/// all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Value of the `SOUR` line written in the document header.
    pub source: String,

    /// Maximum number of history entries kept by a store.
    pub history_limit: usize,

    /// Given name assigned to imported persons that have none.
    pub unknown_given_name: String,

    /// Prefix of the family name synthesized for imported persons that have
    /// none. The person's new identifier is appended, e.g. `import_12`.
    pub placeholder_family_prefix: String,

    /// Relation tags that denote an active union.
    union_kinds: Vec<String>,

    /// Relation tags that dissolve a union between the same pair.
    dissolution_kinds: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            history_limit: history::DEFAULT_LIMIT,
            unknown_given_name: default_unknown_given_name(),
            placeholder_family_prefix: default_placeholder_family_prefix(),
            union_kinds: default_union_kinds(),
            dissolution_kinds: default_dissolution_kinds(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Relation tags that denote a union.
    #[must_use]
    pub fn union_kinds(&self) -> &[String] {
        &self.union_kinds
    }

    /// Relation tags that denote a dissolution.
    #[must_use]
    pub fn dissolution_kinds(&self) -> &[String] {
        &self.dissolution_kinds
    }

    /// Adds a union tag.
    ///
    /// Returns `true` if the tag was added, `false` if it was already present.
    pub fn add_union_kind(&mut self, kind: &str) -> bool {
        add_tag(&mut self.union_kinds, kind)
    }

    /// Adds a dissolution tag.
    ///
    /// Returns `true` if the tag was added, `false` if it was already present.
    pub fn add_dissolution_kind(&mut self, kind: &str) -> bool {
        add_tag(&mut self.dissolution_kinds, kind)
    }

    /// The union/dissolution vocabulary described by this configuration.
    #[must_use]
    pub fn relation_vocabulary(&self) -> RelationVocabulary {
        RelationVocabulary::new(&self.union_kinds, &self.dissolution_kinds)
    }
}

fn add_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() || tags.contains(&tag) {
        false
    } else {
        tags.push(tag);
        true
    }
}

fn default_source() -> String {
    "kinship".to_string()
}

fn default_unknown_given_name() -> String {
    "Unknown".to_string()
}

fn default_placeholder_family_prefix() -> String {
    "import_".to_string()
}

const fn default_history_limit() -> usize {
    history::DEFAULT_LIMIT
}

fn default_union_kinds() -> Vec<String> {
    vec![
        RelationKind::MARRIAGE.to_string(),
        RelationKind::COUPLE.to_string(),
    ]
}

fn default_dissolution_kinds() -> Vec<String> {
    vec![RelationKind::DIVORCE.to_string()]
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_source")]
        source: String,

        #[serde(default = "default_history_limit")]
        history_limit: usize,

        #[serde(default = "default_unknown_given_name")]
        unknown_given_name: String,

        #[serde(default = "default_placeholder_family_prefix")]
        placeholder_family_prefix: String,

        #[serde(default = "default_union_kinds")]
        union_kinds: Vec<String>,

        #[serde(default = "default_dissolution_kinds")]
        dissolution_kinds: Vec<String>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                source,
                history_limit,
                unknown_given_name,
                placeholder_family_prefix,
                union_kinds,
                dissolution_kinds,
            } => Self {
                source,
                history_limit,
                unknown_given_name,
                placeholder_family_prefix,
                union_kinds,
                dissolution_kinds,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            source: config.source,
            history_limit: config.history_limit,
            unknown_given_name: config.unknown_given_name,
            placeholder_family_prefix: config.placeholder_family_prefix,
            union_kinds: config.union_kinds,
            dissolution_kinds: config.dissolution_kinds,
        }
    }
}
