//! Store configuration, optionally read from `mdgraph.toml`.
//!
//! ```toml
//! hash_algorithm = "sha1"
//! compression_level = 6
//! lock_timeout_ms = 1000
//! remote_cache = "/var/cache/mdgraph"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use mdgraph_hash::HashAlgorithm;
use serde::{Deserialize, Deserializer};

use crate::OdbError;

/// File name looked up inside a realm directory.
pub const CONFIG_FILE: &str = "mdgraph.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OdbConfig {
    #[serde(deserialize_with = "algorithm_from_str")]
    pub hash_algorithm: HashAlgorithm,
    /// zlib level for loose objects, 0..=9.
    pub compression_level: u32,
    /// How long to wait for a held realm lock before giving up.
    pub lock_timeout_ms: u64,
    /// Directory for remote realm caches. Defaults to the system temp dir.
    pub remote_cache: Option<PathBuf>,
}

impl Default for OdbConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            compression_level: 6,
            lock_timeout_ms: 1000,
            remote_cache: None,
        }
    }
}

impl OdbConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, OdbError> {
        let config: Self = toml::from_str(text).map_err(|e| OdbError::Config {
            path: origin.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Read `path` if it exists; defaults otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OdbError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read `<dir>/mdgraph.toml` if it exists.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, OdbError> {
        Self::load(dir.as_ref().join(CONFIG_FILE))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn remote_cache_dir(&self) -> PathBuf {
        self.remote_cache
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("mdgraph-remote-cache"))
    }

    /// Range-check values that parsed but are unusable.
    pub fn validate(&self, origin: &Path) -> Result<(), OdbError> {
        if self.compression_level > 9 {
            return Err(OdbError::Config {
                path: origin.to_path_buf(),
                reason: format!("compression_level {} is out of range 0..=9", self.compression_level),
            });
        }
        Ok(())
    }
}

fn algorithm_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<HashAlgorithm, D::Error> {
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}
