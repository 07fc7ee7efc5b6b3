//! Per-request workspace
//!
//! Every transformation request gets one scratch directory under the
//! configured temp root. Intermediate artifacts (uploads, backend outputs,
//! partition results) live inside it, and paths outside it can be tracked
//! explicitly. Cleanup never raises: deletion failures are logged and
//! swallowed so they cannot mask the primary result of the request.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use uuid::Uuid;

/// Scratch directory and tracked artifacts for one request.
///
/// Dropping the workspace removes the scratch directory and everything in
/// it, which covers every exit path (success, error, panic, client
/// disconnect). [`Workspace::release`] performs the same cleanup eagerly
/// and additionally removes tracked paths outside the scratch directory.
pub struct Workspace {
    dir: TempDir,
    tracked: Mutex<Vec<PathBuf>>,
}

impl Workspace {
    /// Create a workspace under the given temp root.
    ///
    /// The root is created if missing. The scratch directory name embeds a
    /// UUID so concurrent requests never collide.
    pub fn create(temp_root: &Path) -> io::Result<Self> {
        fs::create_dir_all(temp_root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("prensa-{}-", Uuid::new_v4()))
            .tempdir_in(temp_root)?;

        tracing::debug!(dir = %dir.path().display(), "Created request workspace");

        Ok(Self {
            dir,
            tracked: Mutex::new(Vec::new()),
        })
    }

    /// Path of the scratch directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Build a path for a named artifact inside the scratch directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Track a path outside the scratch directory for removal at release.
    ///
    /// Paths inside the scratch directory do not need tracking; they are
    /// removed with the directory itself.
    pub fn track(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut tracked = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
        tracked.push(path);
    }

    /// Delete every tracked path still present, then the scratch directory.
    ///
    /// Individual deletion failures are logged at warn level and swallowed.
    pub fn release(self) {
        let tracked = {
            let mut guard = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };

        for path in tracked {
            remove_best_effort(&path);
        }

        // TempDir::close reports errors instead of silently dropping them.
        let dir_path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(
                dir = %dir_path.display(),
                error = %e,
                "Failed to remove request workspace"
            );
        }
    }
}

/// Remove a file or directory, logging (not propagating) failures.
fn remove_best_effort(path: &Path) {
    let result = match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        // Already gone: nothing to do.
        Err(_) => return,
    };

    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove tracked artifact");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_creates_unique_dirs() {
        let root = tempfile::tempdir().unwrap();
        let a = Workspace::create(root.path()).unwrap();
        let b = Workspace::create(root.path()).unwrap();

        assert!(a.dir().exists());
        assert!(b.dir().exists());
        assert_ne!(a.dir(), b.dir());
    }

    #[test]
    fn release_removes_scratch_dir_and_tracked_paths() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(root.path()).unwrap();

        let inside = ws.path("inside.pdf");
        fs::write(&inside, b"x").unwrap();

        let outside = root.path().join("outside.pdf");
        fs::write(&outside, b"y").unwrap();
        ws.track(&outside);

        let scratch = ws.dir().to_path_buf();
        ws.release();

        assert!(!scratch.exists());
        assert!(!inside.exists());
        assert!(!outside.exists());
    }

    #[test]
    fn release_swallows_missing_tracked_paths() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(root.path()).unwrap();

        ws.track(root.path().join("never-existed.pdf"));
        // Must not panic or error.
        ws.release();
    }

    #[test]
    fn drop_removes_scratch_dir() {
        let root = tempfile::tempdir().unwrap();
        let scratch = {
            let ws = Workspace::create(root.path()).unwrap();
            fs::write(ws.path("a"), b"a").unwrap();
            ws.dir().to_path_buf()
        };
        assert!(!scratch.exists());
    }
}
