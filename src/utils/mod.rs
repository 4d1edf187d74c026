//! Filesystem helpers shared by config loading and publishing

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(anyhow!("Path exists but is not a directory: {:?}", path));
    }
    Ok(())
}

/// Get the XDG config directory for the plugin host
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("plugin-host");

    Ok(config_dir)
}

/// Expand `~` and environment variables in a path
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Files under `src` paired with their destination under `dst`
///
/// A file `src` maps to `dst` itself.
pub fn file_pairs(src: &Path, dst: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    if src.is_file() {
        return Ok(vec![(src.to_path_buf(), dst.to_path_buf())]);
    }

    if !src.is_dir() {
        return Err(anyhow!("Source does not exist: {:?}", src));
    }

    let mut pairs = Vec::new();
    for entry in WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| anyhow!("Failed to get relative path: {}", e))?;
        pairs.push((entry.path().to_path_buf(), dst.join(relative)));
    }

    Ok(pairs)
}

/// Copy a single file, creating parent directories
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_directory(parent)?;
    }
    fs::copy(src, dst).with_context(|| format!("Failed to copy {:?} to {:?}", src, dst))?;
    Ok(())
}

/// Format duration as human readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs > 0 {
        format!("{secs}.{millis:03}s")
    } else {
        format!("{millis}ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(
            expand_path(Path::new("./plugins")).unwrap(),
            PathBuf::from("./plugins")
        );
        assert!(expand_path(Path::new("$PLUGIN_HOST_UNSET_VAR/plugins")).is_err());
    }

    #[test]
    fn test_file_pairs_walks_directories() {
        let temp_dir = TempDir::new().unwrap();
        let src_dir = temp_dir.path().join("src");
        fs::create_dir_all(src_dir.join("nested")).unwrap();
        fs::write(src_dir.join("a.txt"), "a").unwrap();
        fs::write(src_dir.join("nested/b.txt"), "b").unwrap();

        let dst_dir = temp_dir.path().join("dst");
        let pairs = file_pairs(&src_dir, &dst_dir).unwrap();

        assert_eq!(
            pairs,
            vec![
                (src_dir.join("a.txt"), dst_dir.join("a.txt")),
                (src_dir.join("nested/b.txt"), dst_dir.join("nested/b.txt")),
            ]
        );

        copy_file(&pairs[1].0, &pairs[1].1).unwrap();
        assert!(dst_dir.join("nested/b.txt").exists());
    }

    #[test]
    fn test_file_pairs_rejects_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        assert!(file_pairs(&temp_dir.path().join("missing"), temp_dir.path()).is_err());
    }
}
