//! Backups and atomic manifest writes

use crate::error::{MigrationError, Result};
use crate::types::BACKUP_ARTIFACTS;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Copy every existing artifact to `<artifact><suffix>`
///
/// Absent artifacts are ignored. Each copy is synced before returning so
/// a crash during the following write cannot lose the original.
pub fn backup_artifacts(package_dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut backups = Vec::new();

    for artifact in BACKUP_ARTIFACTS {
        let original = package_dir.join(artifact);
        if !original.is_file() {
            continue;
        }

        let backup = backup_path(&original, suffix);
        fs::copy(&original, &backup).map_err(|e| MigrationError::io(&backup, e))?;
        File::open(&backup)
            .and_then(|f| f.sync_all())
            .map_err(|e| MigrationError::io(&backup, e))?;

        log::debug!("Backed up {} -> {}", original.display(), backup.display());
        backups.push(backup);
    }

    Ok(backups)
}

/// `<path><suffix>`, e.g. `dbt_project.yml.bak`
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Replace `path` with `contents` via a synced temp file and rename
///
/// Readers see either the old file or the new one, never a partial write.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{file_name}.tmp"));

    let write = || -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        MigrationError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_copies_present_artifacts_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dbt_project.yml"), "name: a\n").unwrap();
        fs::create_dir_all(dir.path().join("groups")).unwrap();
        fs::write(dir.path().join("groups/_group.yml"), "groups: []\n").unwrap();

        let backups = backup_artifacts(dir.path(), ".bak").unwrap();
        assert_eq!(
            backups,
            vec![
                dir.path().join("dbt_project.yml.bak"),
                dir.path().join("groups/_group.yml.bak"),
            ]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("dbt_project.yml.bak")).unwrap(),
            "name: a\n"
        );
        assert!(!dir.path().join("packages.yml.bak").exists());
    }

    #[test]
    fn test_backup_overwrites_previous_backup() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("dbt_project.yml");
        fs::write(&manifest, "v1\n").unwrap();
        backup_artifacts(dir.path(), ".bak").unwrap();
        fs::write(&manifest, "v2\n").unwrap();
        backup_artifacts(dir.path(), ".bak").unwrap();
        assert_eq!(fs::read_to_string(backup_path(&manifest, ".bak")).unwrap(), "v2\n");
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbt_project.yml");
        fs::write(&path, "old\n").unwrap();
        write_atomic(&path, "new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!dir.path().join(".dbt_project.yml.tmp").exists());
    }

    #[test]
    fn test_write_atomic_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("dbt_project.yml");
        match write_atomic(&path, "x") {
            Err(MigrationError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
