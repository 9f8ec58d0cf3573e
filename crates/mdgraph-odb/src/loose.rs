use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use mdgraph_hash::hasher::Hasher;
use mdgraph_hash::{HashAlgorithm, ObjectId};
use mdgraph_object::header::write_header;
use mdgraph_object::Object;
use tracing::{debug, trace};

use crate::lock::LockFile;
use crate::store::validate_pointer_name;
use crate::{ObjectStore, OdbConfig, OdbError, Realm, RealmLock};

const OBJECTS_DIR: &str = "objects";
const REFS_DIR: &str = "refs";
const LOCK_NAME: &str = "mdgraph-realm";

/// Realms stored as directories of git loose objects.
///
/// Layout of a realm directory:
///
/// ```text
/// objects/xx/yyyy…     zlib("<kind> <len>\0<payload>")
/// refs/…               "<hex>\n" pointer files
/// mdgraph-realm.lock   present while a writer holds the realm
/// ```
///
/// Remote realms addressed as `remote:<path>` or `file://<path>` are read
/// straight from that directory and cached under
/// [`OdbConfig::remote_cache_dir`].
#[derive(Debug, Clone, Default)]
pub struct LooseStore {
    config: OdbConfig,
}

impl LooseStore {
    pub fn new(config: OdbConfig) -> Self {
        Self { config }
    }

    /// Store configured from `<dir>/mdgraph.toml`, or defaults.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, OdbError> {
        Ok(Self::new(OdbConfig::load_from_dir(dir)?))
    }

    pub fn config(&self) -> &OdbConfig {
        &self.config
    }

    /// Create the directory skeleton of a local realm.
    pub fn init(&self, realm: &Realm) -> Result<(), OdbError> {
        let dir = self.realm_dir(realm)?;
        fs::create_dir_all(dir.join(OBJECTS_DIR))?;
        fs::create_dir_all(dir.join(REFS_DIR))?;
        debug!(realm = %realm, "initialized realm");
        Ok(())
    }

    /// File holding `oid` inside `realm`.
    pub fn object_path(&self, realm: &Realm, oid: &ObjectId) -> Result<PathBuf, OdbError> {
        let hex = oid.to_hex();
        Ok(self
            .realm_dir(realm)?
            .join(OBJECTS_DIR)
            .join(&hex[..2])
            .join(&hex[2..]))
    }

    fn realm_dir(&self, realm: &Realm) -> Result<PathBuf, OdbError> {
        realm
            .path()
            .ok_or_else(|| OdbError::UnsupportedRemote(realm.to_string()))
    }

    fn pointer_path(&self, realm: &Realm, name: &str) -> Result<PathBuf, OdbError> {
        validate_pointer_name(name)?;
        Ok(self.realm_dir(realm)?.join(name))
    }

    fn compression(&self) -> Compression {
        Compression::new(self.config.compression_level)
    }
}

impl ObjectStore for LooseStore {
    fn hash_algo(&self) -> HashAlgorithm {
        self.config.hash_algorithm
    }

    fn load_object(&self, realm: &Realm, oid: &ObjectId) -> Result<Option<Object>, OdbError> {
        let path = self.object_path(realm, oid)?;
        let compressed = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut raw = Vec::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut raw)
            .map_err(|e| OdbError::Corrupt {
                oid: *oid,
                reason: format!("zlib: {e}"),
            })?;

        let actual = Hasher::digest(oid.algorithm(), &raw)?;
        if actual != *oid {
            return Err(OdbError::Corrupt {
                oid: *oid,
                reason: format!("content hashes to {actual}"),
            });
        }
        trace!(realm = %realm, oid = %oid, "read loose object");
        Ok(Some(Object::parse(&raw, oid.algorithm())?))
    }

    fn store_object(&self, realm: &Realm, object: &Object) -> Result<ObjectId, OdbError> {
        let payload = object.encode_payload();
        let header = write_header(object.kind(), payload.len());
        let oid = {
            let mut hasher = Hasher::new(self.hash_algo());
            hasher.update(&header);
            hasher.update(&payload);
            hasher.finalize()?
        };

        let final_path = self.object_path(realm, &oid)?;
        if final_path.is_file() {
            return Ok(oid);
        }
        let fan_out = final_path
            .parent()
            .ok_or_else(|| OdbError::Corrupt {
                oid,
                reason: "object path has no parent".into(),
            })?;
        fs::create_dir_all(fan_out)?;

        // Temp file in the same directory so the rename stays on one filesystem.
        let tmp = tempfile::NamedTempFile::new_in(fan_out)?;
        let mut encoder = ZlibEncoder::new(tmp, self.compression());
        encoder.write_all(&header)?;
        encoder.write_all(&payload)?;
        let tmp = encoder.finish()?;
        tmp.as_file().sync_all()?;
        if let Err(e) = tmp.persist(&final_path) {
            // Another writer got there first; the content is identical.
            if !final_path.is_file() {
                return Err(e.error.into());
            }
        }
        trace!(realm = %realm, oid = %oid, kind = %object.kind(), "wrote loose object");
        Ok(oid)
    }

    fn contains_object(&self, realm: &Realm, oid: &ObjectId) -> Result<bool, OdbError> {
        Ok(self.object_path(realm, oid)?.is_file())
    }

    fn read_named_pointer(&self, realm: &Realm, name: &str) -> Result<Option<ObjectId>, OdbError> {
        let path = self.pointer_path(realm, name)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(text.trim().parse()?))
    }

    fn update_named_pointer(&self, realm: &Realm, name: &str, oid: &ObjectId) -> Result<(), OdbError> {
        if realm.is_remote() {
            return Err(OdbError::ReadOnlyRemote(realm.to_string()));
        }
        let path = self.pointer_path(realm, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut lock = LockFile::acquire_with_timeout(&path, self.config.lock_timeout())?;
        writeln!(lock, "{}", oid.to_hex())?;
        lock.commit()?;
        debug!(realm = %realm, pointer = name, oid = %oid, "updated pointer");
        Ok(())
    }

    fn delete_named_pointer(&self, realm: &Realm, name: &str) -> Result<bool, OdbError> {
        let path = self.pointer_path(realm, name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_named_pointers(&self, realm: &Realm, prefix: &str) -> Result<Vec<(String, ObjectId)>, OdbError> {
        let dir = self.realm_dir(realm)?;
        let mut out = Vec::new();
        collect_pointers(&dir.join(REFS_DIR), REFS_DIR, prefix, &mut out)?;
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn lock_realm(&self, realm: &Realm) -> Result<RealmLock, OdbError> {
        if realm.is_remote() {
            return Err(OdbError::ReadOnlyRemote(realm.to_string()));
        }
        let dir = self.realm_dir(realm)?;
        fs::create_dir_all(&dir)?;
        RealmLock::file(realm, &dir.join(LOCK_NAME), self.config.lock_timeout())
    }

    fn remote_cache(&self, remote: &Realm) -> Result<Realm, OdbError> {
        let dir = self.config.remote_cache_dir().join(remote.cache_key());
        Ok(Realm::local(dir))
    }
}

fn collect_pointers(
    dir: &Path,
    name: &str,
    prefix: &str,
    out: &mut Vec<(String, ObjectId)>,
) -> Result<(), OdbError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let child = format!("{name}/{file_name}");
        // Skip subtrees that cannot contain a match.
        if !child.starts_with(prefix) && !prefix.starts_with(&child) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            collect_pointers(&entry.path(), &child, prefix, out)?;
        } else if !file_name.ends_with(".lock") && child.starts_with(prefix) {
            let text = fs::read_to_string(entry.path())?;
            out.push((child, text.trim().parse()?));
        }
    }
    Ok(())
}
