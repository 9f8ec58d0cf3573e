use std::path::Path;

use mdgraph_odb::config::CONFIG_FILE;
use mdgraph_odb::{OdbConfig, OdbError};
use serde::Deserialize;

use crate::RealmError;

/// Realm settings from `mdgraph.toml`: the store keys at top level plus an
/// `[author]` table used for snapshot commits.
///
/// ```toml
/// compression_level = 9
///
/// [author]
/// name = "Catalogue Bot"
/// email = "bot@example.org"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RealmConfig {
    #[serde(flatten)]
    pub store: OdbConfig,
    pub author: AuthorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    pub name: String,
    pub email: String,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: "mdgraph".into(),
            email: "mdgraph@localhost".into(),
        }
    }
}

impl RealmConfig {
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, RealmError> {
        let config: Self = toml::from_str(text).map_err(|e| OdbError::Config {
            path: origin.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        config.store.validate(origin)?;
        Ok(config)
    }

    /// Read `<dir>/mdgraph.toml`; defaults when it does not exist.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, RealmError> {
        let path = dir.as_ref().join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(OdbError::Io(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdgraph_hash::HashAlgorithm;

    #[test]
    fn store_keys_and_author_table() {
        let text = r#"
hash_algorithm = "sha256"
lock_timeout_ms = 50

[author]
name = "Catalogue Bot"
"#;
        let config = RealmConfig::from_toml(text, Path::new("mdgraph.toml")).unwrap();
        assert_eq!(config.store.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.store.lock_timeout_ms, 50);
        assert_eq!(config.store.compression_level, 6);
        assert_eq!(config.author.name, "Catalogue Bot");
        assert_eq!(config.author.email, "mdgraph@localhost");
    }

    #[test]
    fn invalid_level_rejected() {
        assert!(matches!(
            RealmConfig::from_toml("compression_level = 10", Path::new("x")),
            Err(RealmError::Odb(OdbError::Config { .. }))
        ));
    }
}
