//! 標準ファイルシステム実装（std::fs を委譲）

use crate::error::Error;
use crate::ports::outbound::FileSystem;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// std::fs を使う FileSystem 実装
#[derive(Debug, Clone, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String, Error> {
        fs::read_to_string(path)
            .map_err(|e| Error::io_msg(format!("read {}: {}", path.display(), e)))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), Error> {
        fs::write(path, contents)
            .map_err(|e| Error::io_msg(format!("write {}: {}", path.display(), e)))
    }

    fn open_append(&self, path: &Path) -> Result<Box<dyn Write + Send>, Error> {
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::io_msg(format!("open {}: {}", path.display(), e)))?;
        Ok(Box::new(f))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), Error> {
        fs::create_dir_all(path)
            .map_err(|e| Error::io_msg(format!("create_dir_all {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        let fs = StdFileSystem;
        fs.write(&path, "one\n").unwrap();
        {
            let mut w = fs.open_append(&path).unwrap();
            w.write_all(b"two\n").unwrap();
        }
        assert_eq!(fs.read_to_string(&path).unwrap(), "one\ntwo\n");
        assert!(fs.exists(&path));
    }

    #[test]
    fn test_read_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StdFileSystem
            .read_to_string(&dir.path().join("missing.txt"))
            .unwrap_err();
        assert_eq!(err.exit_code(), 74);
    }

    #[test]
    fn test_create_dir_all_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        StdFileSystem.create_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
