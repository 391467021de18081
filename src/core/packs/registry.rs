// ─── Global Resource Pack Registry ───
// Read-modify-write access to the host's `global_resource_packs.json`.
//
// The file is shared with other producers. Entries we add carry an owner tag;
// entries without one are never removed or rewritten by us. There is no
// locking: a concurrent writer in another process can lose updates.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::error::{LoaderError, LoaderResult};

pub const OWNER_TAG_FIELD: &str = "owner_tag";

/// One entry this loader writes into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackRegistration {
    pub pack_id: String,
    pub version: [u32; 3],
    pub owner_tag: String,
}

impl PackRegistration {
    pub fn new(pack_id: impl Into<String>, owner_tag: &str) -> Self {
        Self {
            pack_id: pack_id.into(),
            version: [1, 0, 0],
            owner_tag: owner_tag.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackRegistry {
    path: PathBuf,
}

impl PackRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries. Missing, empty or unparseable files read as empty.
    pub fn read(&self) -> Vec<Value> {
        match self.read_existing() {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Unreadable pack registry {:?}: {}, treating as empty", self.path, e);
                Vec::new()
            }
        }
    }

    /// `None` when the file is missing or blank.
    fn read_existing(&self) -> LoaderResult<Option<Vec<Value>>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LoaderError::io(&self.path, e)),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(trimmed)?))
    }

    /// Replace the registry file with `entries`.
    pub fn write(&self, entries: &[Value]) -> LoaderResult<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| LoaderError::Other(format!("No parent for {:?}", self.path)))?;
        std::fs::create_dir_all(parent).map_err(|e| LoaderError::io(parent, e))?;

        let json = serde_json::to_string_pretty(entries)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| LoaderError::io(parent, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| LoaderError::io(tmp.path(), e))?;
        // The temp file starts out owner-only; the registry is read by other users.
        if let Some(permissions) = self.target_permissions()? {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(|e| LoaderError::io(tmp.path(), e))?;
        }
        tmp.persist(&self.path)
            .map_err(|e| LoaderError::io(&self.path, e.error))?;
        Ok(())
    }

    /// Permissions of the current file, or the usual `rw-r--r--` for a new one
    /// on unix.
    fn target_permissions(&self) -> LoaderResult<Option<std::fs::Permissions>> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.permissions())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(default_permissions()),
            Err(e) => Err(LoaderError::io(&self.path, e)),
        }
    }

    /// Put `registration` first, dropping prior entries with the same pack id
    /// or the same owner tag, and persist.
    pub fn register(&self, registration: &PackRegistration) -> LoaderResult<()> {
        let existing = self.read();
        let mut entries = Vec::with_capacity(existing.len() + 1);
        entries.push(serde_json::to_value(registration)?);

        for entry in existing {
            let same_id = entry.get("pack_id").and_then(Value::as_str)
                == Some(registration.pack_id.as_str());
            let same_owner = owner_tag(&entry) == Some(registration.owner_tag.as_str());
            if same_id || same_owner {
                debug!("Replacing registry entry {}", entry);
                continue;
            }
            entries.push(entry);
        }

        self.write(&entries)
    }

    /// Drop every entry carrying an owner tag. Returns how many went.
    ///
    /// A missing, blank or `[]` file is left alone, and so is one that does
    /// not parse: rewriting it would erase other producers' entries.
    pub fn reset_owned(&self) -> LoaderResult<usize> {
        let entries = match self.read_existing() {
            Ok(Some(entries)) => entries,
            Ok(None) => return Ok(0),
            Err(e) => {
                warn!("Pack registry {:?} unreadable, not resetting: {}", self.path, e);
                return Ok(0);
            }
        };

        let before = entries.len();
        let kept: Vec<Value> = entries
            .into_iter()
            .filter(|entry| entry.get(OWNER_TAG_FIELD).is_none())
            .collect();
        let removed = before - kept.len();

        if removed > 0 {
            self.write(&kept)?;
            info!("Removed {} loader entries from {:?}", removed, self.path);
        }
        Ok(removed)
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<std::fs::Permissions> {
    None
}

fn owner_tag(entry: &Value) -> Option<&str> {
    entry.get(OWNER_TAG_FIELD).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn registry(dir: &Path) -> PackRegistry {
        PackRegistry::new(dir.join("games/com.mojang/minecraftpe/global_resource_packs.json"))
    }

    #[test]
    fn register_prepends_and_keeps_foreign_entries() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        registry
            .write(&[json!({"pack_id": "foreign", "version": [2, 0, 0]})])
            .unwrap();

        let registration = PackRegistration::new(Uuid::new_v4().to_string(), "foo.ncm");
        registry.register(&registration).unwrap();

        let entries = registry.read();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["pack_id"], json!(registration.pack_id));
        assert_eq!(entries[0]["version"], json!([1, 0, 0]));
        assert_eq!(entries[0]["owner_tag"], json!("foo.ncm"));
        assert_eq!(entries[1]["pack_id"], json!("foreign"));
    }

    #[test]
    fn register_replaces_previous_entry_of_same_owner() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        registry.register(&PackRegistration::new(Uuid::new_v4().to_string(), "foo.ncm")).unwrap();
        let second = PackRegistration::new(Uuid::new_v4().to_string(), "foo.ncm");
        registry.register(&second).unwrap();

        let entries = registry.read();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["pack_id"], json!(second.pack_id));
    }

    #[test]
    fn register_over_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        std::fs::create_dir_all(registry.path().parent().unwrap()).unwrap();
        std::fs::write(registry.path(), "{ broken").unwrap();

        registry.register(&PackRegistration::new(Uuid::new_v4().to_string(), "foo.ncm")).unwrap();
        assert_eq!(registry.read().len(), 1);
    }

    #[test]
    fn reset_keeps_untagged_entries_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        registry
            .write(&[
                json!({"pack_id": "ours-1", "version": [1, 0, 0], "owner_tag": "a.ncm"}),
                json!({"pack_id": "theirs", "version": [1, 2, 0]}),
                json!({"pack_id": "ours-2", "version": [1, 0, 0], "owner_tag": "b.ncm"}),
            ])
            .unwrap();

        assert_eq!(registry.reset_owned().unwrap(), 2);
        let once = std::fs::read(registry.path()).unwrap();
        assert_eq!(registry.reset_owned().unwrap(), 0);
        let twice = std::fs::read(registry.path()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(registry.read(), vec![json!({"pack_id": "theirs", "version": [1, 2, 0]})]);
    }

    #[test]
    fn reset_on_missing_or_empty_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        assert_eq!(registry.reset_owned().unwrap(), 0);
        assert!(!registry.path().exists());

        std::fs::create_dir_all(registry.path().parent().unwrap()).unwrap();
        std::fs::write(registry.path(), "[]").unwrap();
        assert_eq!(registry.reset_owned().unwrap(), 0);
        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), "[]");
    }

    #[test]
    fn reset_leaves_corrupt_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        std::fs::create_dir_all(registry.path().parent().unwrap()).unwrap();
        std::fs::write(registry.path(), "not json").unwrap();

        assert_eq!(registry.reset_owned().unwrap(), 0);
        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), "not json");
    }

    #[test]
    fn reset_drops_entries_with_non_string_owner_tag() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        registry
            .write(&[
                json!({"pack_id": "odd", "version": [1, 0, 0], "owner_tag": 7}),
                json!({"pack_id": "null-tag", "version": [1, 0, 0], "owner_tag": null}),
                json!({"pack_id": "theirs", "version": [1, 0, 0]}),
            ])
            .unwrap();

        assert_eq!(registry.reset_owned().unwrap(), 2);
        assert_eq!(registry.read(), vec![json!({"pack_id": "theirs", "version": [1, 0, 0]})]);
    }

    #[cfg(unix)]
    #[test]
    fn rewrites_keep_the_registry_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;

        registry.register(&PackRegistration::new("first", "a.ncm")).unwrap();
        assert_eq!(mode(registry.path()), 0o644);

        std::fs::set_permissions(registry.path(), std::fs::Permissions::from_mode(0o664)).unwrap();
        registry.register(&PackRegistration::new("second", "b.ncm")).unwrap();
        assert_eq!(mode(registry.path()), 0o664);

        assert_eq!(registry.reset_owned().unwrap(), 2);
        assert_eq!(mode(registry.path()), 0o664);
    }
}
