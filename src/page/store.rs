//! Durable page storage: one flat file per title.
//!
//! # Layout
//!
//! ```text
//! data/
//! ├── Home.txt
//! ├── FrontPage.txt
//! └── Notes2.txt
//! ```
//!
//! Saves go through a temp file in the same directory followed by a
//! rename, so a concurrent `load` sees either the old body or the new
//! one, never a prefix of it.

use super::{Page, Title};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;

/// File suffix for stored pages.
const PAGE_SUFFIX: &str = ".txt";

/// Page storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The page has never been saved.
    #[error("page `{0}` not found")]
    NotFound(Title),

    #[error("IO error on `{0}`: {1}")]
    Io(PathBuf, #[source] io::Error),
}

/// Read/write access to pages keyed by title.
pub trait PageStore: Send + Sync {
    /// Load a page. A page that was never saved is `StoreError::NotFound`.
    fn load(&self, title: &Title) -> Result<Page, StoreError>;

    /// Create or fully overwrite a page.
    fn save(&self, page: &Page) -> Result<(), StoreError>;
}

/// Filesystem-backed store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the storage directory if it does not exist.
    ///
    /// Returns `true` if the directory was created.
    pub fn ensure_dir(&self) -> Result<bool, StoreError> {
        if self.dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&self.dir).map_err(|err| StoreError::Io(self.dir.clone(), err))?;
        Ok(true)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Storage location for `title`: `<dir>/<title>.txt`.
    ///
    /// Titles never contain separators or dots, so the result always
    /// stays directly inside `dir`.
    pub fn path_for(&self, title: &Title) -> PathBuf {
        self.dir.join(format!("{title}{PAGE_SUFFIX}"))
    }
}

impl PageStore for FsStore {
    fn load(&self, title: &Title) -> Result<Page, StoreError> {
        let path = self.path_for(title);
        match fs::read(&path) {
            Ok(body) => Ok(Page::new(title.clone(), body)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(title.clone()))
            }
            Err(err) => Err(StoreError::Io(path, err)),
        }
    }

    fn save(&self, page: &Page) -> Result<(), StoreError> {
        let path = self.path_for(&page.title);
        let io_err = |err: io::Error| StoreError::Io(path.clone(), err);

        let mut file = NamedTempFile::new_in(&self.dir)
            .map_err(|err| StoreError::Io(self.dir.clone(), err))?;
        file.write_all(&page.body).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        set_owner_only(file.path()).map_err(io_err)?;
        file.persist(&path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

/// Restrict a file to owner read/write (0600).
#[cfg(unix)]
fn set_owner_only(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> io::Result<()> {
    Ok(())
}
