//! Atomic file writes.
//!
//! Uploaded documents and rule artifacts are read by concurrent requests, so
//! a reader must never observe a half-written file. Every write goes through
//! the same pattern:
//!
//! 1. Write the content to a uniquely named temporary file in the target's
//!    directory (same filesystem, so the rename below is atomic)
//! 2. Sync the file to disk
//! 3. Rename it over the target
//!
//! If any step fails the temporary file is removed and the target is left
//! untouched.

use crate::error::{DocfillError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| {
            DocfillError::Storage(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    // NamedTempFile deletes itself on drop, which covers every early return below.
    let mut temp = NamedTempFile::new_in(parent).map_err(|e| {
        DocfillError::Storage(format!(
            "failed to create temporary file in '{}': {}",
            parent.display(),
            e
        ))
    })?;

    temp.write_all(content)
        .map_err(|e| DocfillError::Storage(format!("failed to write temporary file: {}", e)))?;

    temp.as_file()
        .sync_all()
        .map_err(|e| DocfillError::Storage(format!("failed to sync temporary file: {}", e)))?;

    temp.persist(path).map_err(|e| {
        DocfillError::Storage(format!(
            "failed to atomically replace '{}': {}",
            path.display(),
            e.error
        ))
    })?;

    Ok(())
}

/// Atomically write a string to a file.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("rule_Salary.js");

        atomic_write_file(&file_path, "function generate_Salary(data) { return '1'; }").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert!(content.contains("generate_Salary"));
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("template.html");
        fs::write(&file_path, "<p>old</p>").unwrap();

        atomic_write(&file_path, b"<p>new</p>").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "<p>new</p>");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("uploads").join("default").join("data.xml");

        atomic_write(&file_path, b"<root/>").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "<root/>");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("out.txt");

        atomic_write(&file_path, b"content").unwrap();
        atomic_write(&file_path, b"content again").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("out.txt")]);
    }

    #[test]
    fn test_atomic_write_binary_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("document.pdf");
        let binary: Vec<u8> = (0..=255u8).collect();

        atomic_write(&file_path, &binary).unwrap();

        assert_eq!(fs::read(&file_path).unwrap(), binary);
    }

    #[test]
    fn test_atomic_write_concurrent_writers_to_same_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shared.txt");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    atomic_write_file(&path, &format!("writer {}", i)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Last writer wins, but the file is always one complete payload.
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("writer "));
        assert!(content["writer ".len()..].parse::<u32>().is_ok());
    }
}
