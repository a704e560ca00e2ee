//! Where migration scripts come from.
//!
//! The runner only needs two things from a source: the names it offers and
//! the body behind each name. Scripts may live in a directory on disk or be
//! compiled into the binary.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MigrateError, Result};

/// Extension a script name must carry to be considered.
pub const SCRIPT_EXTENSION: &str = ".sql";

/// Scripts shipped with this crate, in application order.
pub const BUNDLED: &[(&str, &str)] = &[
    ("001_init.sql", include_str!("../sql/001_init.sql")),
    ("002_add_indexes.sql", include_str!("../sql/002_add_indexes.sql")),
    (
        "003_seed_component_catalog.sql",
        include_str!("../sql/003_seed_component_catalog.sql"),
    ),
];

/// Returns whether `name` is a migration script name.
#[must_use]
pub fn is_script(name: &str) -> bool {
    name.ends_with(SCRIPT_EXTENSION)
}

/// A named collection of SQL scripts.
#[allow(async_fn_in_trait)]
pub trait ScriptSource {
    /// Names of the available scripts, in no particular order.
    async fn list(&self) -> Result<Vec<String>>;

    /// Full body of the script called `name`.
    async fn read(&self, name: &str) -> Result<String>;
}

/// Scripts stored as files in one directory. Subdirectories are ignored.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    /// Creates a source reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ScriptSource for DirSource {
    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MigrateError::MigrationsDirNotFound(self.dir.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            // Follows symlinks; dangling links are skipped.
            match tokio::fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %entry.path().display(), "Skipping dangling link");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_script(name) {
                    names.push(name.to_string());
                }
            }
        }
        debug!(dir = %self.dir.display(), count = names.len(), "Listed migration scripts");
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<String> {
        match tokio::fs::read_to_string(self.dir.join(name)).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(MigrateError::ScriptNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Scripts held in memory, typically compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSource {
    scripts: Vec<(String, String)>,
}

impl EmbeddedSource {
    /// Creates a source from `(name, body)` pairs.
    pub fn new<I, N, B>(scripts: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: Into<String>,
    {
        Self {
            scripts: scripts
                .into_iter()
                .map(|(n, b)| (n.into(), b.into()))
                .collect(),
        }
    }

    /// The inventory schema shipped with this crate.
    #[must_use]
    pub fn bundled() -> Self {
        Self::new(BUNDLED.iter().copied())
    }
}

impl ScriptSource for EmbeddedSource {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .scripts
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| is_script(name))
            .collect())
    }

    async fn read(&self, name: &str) -> Result<String> {
        self.scripts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| MigrateError::ScriptNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dir_source_lists_sql_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("002_b.sql"), "SELECT 2;").unwrap();
        std::fs::write(dir.path().join("001_a.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("README.md"), "notes").unwrap();
        std::fs::create_dir(dir.path().join("999_dir.sql")).unwrap();

        let source = DirSource::new(dir.path());
        let mut names = source.list().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["001_a.sql", "002_b.sql"]);
        assert_eq!(source.read("001_a.sql").await.unwrap(), "SELECT 1;");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dir_source_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("scripts");
        std::fs::create_dir(&scripts).unwrap();
        let shared = dir.path().join("shared.sql");
        std::fs::write(&shared, "SELECT 1;").unwrap();
        std::os::unix::fs::symlink(&shared, scripts.join("001_linked.sql")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.sql"), scripts.join("002_dangling.sql"))
            .unwrap();

        let source = DirSource::new(&scripts);
        assert_eq!(source.list().await.unwrap(), vec!["001_linked.sql"]);
        assert_eq!(source.read("001_linked.sql").await.unwrap(), "SELECT 1;");
    }

    #[tokio::test]
    async fn test_dir_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirSource::new(dir.path().join("absent"));
        assert!(matches!(
            source.list().await,
            Err(MigrateError::MigrationsDirNotFound(_))
        ));

        let source = DirSource::new(dir.path());
        assert!(matches!(
            source.read("nope.sql").await,
            Err(MigrateError::ScriptNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_embedded_source() {
        let source = EmbeddedSource::new([("001_a.sql", "SELECT 1;"), ("notes.txt", "x")]);
        assert_eq!(source.list().await.unwrap(), vec!["001_a.sql"]);
        assert_eq!(source.read("001_a.sql").await.unwrap(), "SELECT 1;");
        assert!(source.read("002.sql").await.is_err());
    }

    #[tokio::test]
    async fn test_bundled_scripts_present() {
        let names = EmbeddedSource::bundled().list().await.unwrap();
        assert_eq!(
            names,
            vec![
                "001_init.sql",
                "002_add_indexes.sql",
                "003_seed_component_catalog.sql"
            ]
        );
    }
}
