//! Filesystem abstraction layer for testability
//!
//! Address sources and blacklist sinks go through the [`FileSystem`] trait so
//! their I/O paths can be exercised without touching the real filesystem.
//! Uses mockall for automatic mock generation in test builds.

use std::io::{self, Write};
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Trait abstracting the filesystem operations the analyser needs.
///
/// # Example (testing)
/// ```ignore
/// use iprange_analyser::fs_abstraction::MockFileSystem;
/// use std::path::Path;
///
/// let mut mock_fs = MockFileSystem::new();
/// mock_fs.expect_read_to_string()
///     .returning(|_| Ok("10.0.0.1\n".to_string()));
/// ```
#[cfg_attr(test, automock)]
pub trait FileSystem: Send + Sync {
    /// Read file contents as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace a file's contents atomically.
    ///
    /// Readers see either the old file or the complete new one, never a
    /// partially written file.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation using std::fs.
#[derive(Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        use tempfile::NamedTempFile;

        // Temp file in the target directory so the rename stays on one filesystem
        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent_dir)?;

        temp_file.write_all(contents)?;
        temp_file.as_file().sync_all()?;

        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Global filesystem instance for production use.
static REAL_FS: RealFileSystem = RealFileSystem;

/// Get a reference to the global real filesystem instance.
///
/// For testing, create a `MockFileSystem` instead.
pub fn real_fs() -> &'static RealFileSystem {
    &REAL_FS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_read_write() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("blacklist.txt");

        let fs = RealFileSystem;
        fs.write_atomic(&file_path, b"10.0.0.0/24\n").unwrap();

        let content = fs.read_to_string(&file_path).unwrap();
        assert_eq!(content, "10.0.0.0/24\n");
    }

    #[test]
    fn test_real_fs_write_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("blacklist.txt");

        let fs = RealFileSystem;
        fs.write_atomic(&file_path, b"first version, longer").unwrap();
        fs.write_atomic(&file_path, b"second").unwrap();

        assert_eq!(fs.read_to_string(&file_path).unwrap(), "second");
    }

    #[test]
    fn test_real_fs_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let fs = RealFileSystem;
        fs.write_atomic(&temp_dir.path().join("out.txt"), b"x").unwrap();

        let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_real_fs_exists() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        let fs = RealFileSystem;
        assert!(!fs.exists(&file_path));
        fs.write_atomic(&file_path, b"test").unwrap();
        assert!(fs.exists(&file_path));
    }

    #[test]
    fn test_real_fs_read_nonexistent() {
        let fs = RealFileSystem;
        let result = fs.read_to_string(Path::new("/nonexistent/path/file.txt"));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_write_to_nonexistent_dir() {
        let fs = RealFileSystem;
        let result = fs.write_atomic(Path::new("/nonexistent/path/file.txt"), b"test");
        assert!(result.is_err());
    }

    #[test]
    fn test_real_fs_static_instance() {
        assert!(!real_fs().exists(Path::new("/nonexistent/path")));
    }

    #[test]
    fn test_real_fs_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RealFileSystem>();
    }

    #[test]
    fn test_mock_fs_error_simulation() {
        let mut mock = MockFileSystem::new();
        mock.expect_read_to_string().returning(|_| {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "access denied",
            ))
        });

        let result = mock.read_to_string(Path::new("/any/path"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }
}
