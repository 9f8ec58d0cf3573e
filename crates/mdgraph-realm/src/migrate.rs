//! Upgrading realms written by older releases.
//!
//! | version | unlinked objects are protected by |
//! |---|---|
//! | 1 | one pointer per object, `refs/mdgraph/objects/<hex>` |
//! | 2 | a blob of hex ids, one per line, at `refs/mdgraph/object-list` |
//! | 3 | the reachability tree at [`REACHABLE`](crate::REACHABLE) |
//!
//! The version is a blob behind [`FORMAT`](crate::FORMAT). Realms without
//! one are classified by which legacy pointers they carry. Each step writes
//! the new representation, then the version, then removes the old
//! representation, so an interrupted run is resumed by running again.

use std::collections::BTreeSet;

use mdgraph_hash::ObjectId;
use mdgraph_odb::OdbError;
use tracing::{info, warn};

use crate::{RealmError, Repository, FORMAT};

pub const CURRENT_VERSION: u32 = 3;

const V1_PREFIX: &str = "refs/mdgraph/objects/";
const V2_POINTER: &str = "refs/mdgraph/object-list";

/// Outcome of [`migrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from: u32,
    pub to: u32,
    /// Objects carried into the current representation.
    pub objects: usize,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.objects == 0
    }
}

/// Version recorded behind [`FORMAT`](crate::FORMAT), if any.
pub fn stored_version(repo: &Repository) -> Result<Option<u32>, RealmError> {
    let Some(oid) = repo.root(FORMAT)? else {
        return Ok(None);
    };
    let data = repo.store().read_blob(repo.realm(), &oid)?;
    let version = std::str::from_utf8(&data)
        .ok()
        .and_then(|text| text.trim().parse().ok())
        .ok_or_else(|| RealmError::Corrupt {
            what: FORMAT.to_string(),
            reason: format!("not a version number: {:?}", String::from_utf8_lossy(&data)),
        })?;
    Ok(Some(version))
}

/// Format version of the realm, inferred for unversioned realms.
pub fn detect_version(repo: &Repository) -> Result<u32, RealmError> {
    if let Some(version) = stored_version(repo)? {
        return Ok(version);
    }
    if !legacy_pointers(repo)?.is_empty() {
        return Ok(1);
    }
    if repo.root(V2_POINTER)?.is_some() {
        return Ok(2);
    }
    Ok(CURRENT_VERSION)
}

/// Bring the realm to [`CURRENT_VERSION`]. Running it again is a no-op.
pub fn migrate(repo: &Repository) -> Result<MigrationReport, RealmError> {
    repo.locked(|| {
        let from = detect_version(repo)?;
        if from > CURRENT_VERSION {
            return Err(RealmError::UnsupportedFormat(from));
        }

        let mut version = from;
        let mut objects = 0;
        if version == 1 {
            objects = upgrade_v1(repo)?;
            version = 2;
        }
        if version == 2 {
            objects = upgrade_v2(repo)?;
            version = 3;
        }
        if stored_version(repo)? != Some(version) {
            write_version(repo, version)?;
        }

        let report = MigrationReport {
            from,
            to: version,
            objects,
        };
        if !report.is_noop() {
            info!(realm = %repo.realm(), from, to = version, objects, "migrated realm");
        }
        Ok(report)
    })
}

/// Stamp a realm with no version and no legacy data as current.
pub(crate) fn stamp_if_fresh(repo: &Repository) -> Result<(), RealmError> {
    repo.locked(|| {
        if stored_version(repo)?.is_none() && detect_version(repo)? == CURRENT_VERSION {
            write_version(repo, CURRENT_VERSION)?;
        }
        Ok(())
    })
}

fn write_version(repo: &Repository, version: u32) -> Result<(), RealmError> {
    let oid = repo.store().write_blob(repo.realm(), format!("{version}\n").as_bytes())?;
    repo.store().update_named_pointer(repo.realm(), FORMAT, &oid)?;
    Ok(())
}

fn legacy_pointers(repo: &Repository) -> Result<Vec<(String, ObjectId)>, RealmError> {
    Ok(repo.store().list_named_pointers(repo.realm(), V1_PREFIX)?)
}

fn read_object_list(repo: &Repository) -> Result<BTreeSet<ObjectId>, RealmError> {
    let Some(oid) = repo.root(V2_POINTER)? else {
        return Ok(BTreeSet::new());
    };
    let data = repo.store().read_blob(repo.realm(), &oid)?;
    let text = std::str::from_utf8(&data).map_err(|_| RealmError::Corrupt {
        what: V2_POINTER.to_string(),
        reason: "object list is not UTF-8".into(),
    })?;
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            ObjectId::from_hex(line).map_err(|e| RealmError::Corrupt {
                what: V2_POINTER.to_string(),
                reason: format!("'{line}': {e}"),
            })
        })
        .collect()
}

/// Per-object pointers into one object-list blob.
fn upgrade_v1(repo: &Repository) -> Result<usize, RealmError> {
    let legacy = legacy_pointers(repo)?;
    let mut ids = read_object_list(repo)?;
    ids.extend(legacy.iter().map(|(_, oid)| *oid));

    let list: String = ids.iter().map(|oid| format!("{}\n", oid.to_hex())).collect();
    let blob = repo.store().write_blob(repo.realm(), list.as_bytes())?;
    repo.store().update_named_pointer(repo.realm(), V2_POINTER, &blob)?;
    write_version(repo, 2)?;

    for (name, _) in &legacy {
        repo.store().delete_named_pointer(repo.realm(), name)?;
    }
    Ok(ids.len())
}

/// Object-list blob, plus any stray per-object pointers, into the
/// reachability tree.
fn upgrade_v2(repo: &Repository) -> Result<usize, RealmError> {
    let legacy = legacy_pointers(repo)?;
    let mut ids = read_object_list(repo)?;
    ids.extend(legacy.iter().map(|(_, oid)| *oid));

    let mut objects = Vec::with_capacity(ids.len());
    for oid in ids {
        match repo.store().read_object(repo.realm(), &oid) {
            Ok(object) => objects.push((oid, object.kind())),
            Err(OdbError::NotFound { .. }) => {
                warn!(realm = %repo.realm(), oid = %oid, "dropping missing object from legacy list");
            }
            Err(e) => return Err(e.into()),
        }
    }
    let count = objects.len();
    repo.protect_locked(objects)?;
    write_version(repo, 3)?;

    repo.store().delete_named_pointer(repo.realm(), V2_POINTER)?;
    for (name, _) in &legacy {
        repo.store().delete_named_pointer(repo.realm(), name)?;
    }
    Ok(count)
}
