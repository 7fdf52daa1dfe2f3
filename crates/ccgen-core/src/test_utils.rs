//! Test utilities for ccgen

use std::fs;
use tempfile::TempDir;

/// Create a repository with a specific file structure
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_repo_with_structure() {
        let temp_dir = create_repo_with_structure(&[("lib/a.h", ""), (".ccgen.toml", "")]);
        let root = temp_dir.path();

        assert!(root.join("lib/a.h").exists());
        assert!(root.join(".ccgen.toml").exists());
    }
}
