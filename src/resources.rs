//! Resource path aggregation for booted plugins

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use plugin_host_api::ResourceDeclarations;

/// Pattern appended to migration and model directories
const RECURSIVE_GLOB: &str = "**/*";

#[derive(Debug, Default)]
struct ResourcePaths {
    migrations: Vec<String>,
    seeders: Vec<String>,
    models: Vec<String>,
}

/// Flat lists of resource paths contributed by booted plugins
///
/// Consumed by the migration runner and the model loader.
#[derive(Debug, Default)]
pub struct ResourceAggregator {
    paths: RwLock<ResourcePaths>,
}

impl ResourceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the declared directories that exist under `root`
    ///
    /// Every declaration names a directory. Declarations pointing at a missing
    /// path, or at a regular file, are skipped.
    pub async fn register_plugin_resources(
        &self,
        plugin: &str,
        root: &Path,
        declarations: &ResourceDeclarations,
    ) {
        let mut paths = self.paths.write().await;

        if let Some(dir) = existing_dir(plugin, root, declarations.migrations.as_deref()) {
            paths.migrations.push(with_glob(&dir));
        }

        if let Some(dir) = existing_dir(plugin, root, declarations.seeders.as_deref()) {
            paths.seeders.push(dir.to_string_lossy().into_owned());
        }

        if let Some(dir) = existing_dir(plugin, root, declarations.models.as_deref()) {
            paths.models.push(with_glob(&dir));
        }
    }

    /// Migration glob patterns
    pub async fn migration_paths(&self) -> Vec<String> {
        self.paths.read().await.migrations.clone()
    }

    /// Seeder directories
    pub async fn seeder_paths(&self) -> Vec<String> {
        self.paths.read().await.seeders.clone()
    }

    /// Model glob patterns
    pub async fn entity_paths(&self) -> Vec<String> {
        self.paths.read().await.models.clone()
    }

    /// Concrete migration files matched by the migration patterns
    pub async fn expand_migrations(&self) -> Result<Vec<PathBuf>> {
        expand(&self.migration_paths().await)
    }

    /// Concrete model files matched by the model patterns
    pub async fn expand_models(&self) -> Result<Vec<PathBuf>> {
        expand(&self.entity_paths().await)
    }
}

fn existing_dir(plugin: &str, root: &Path, declared: Option<&str>) -> Option<PathBuf> {
    let dir = root.join(declared?);
    if dir.is_dir() {
        Some(dir)
    } else {
        debug!("Plugin {} declares resource directory {:?} which does not exist", plugin, dir);
        None
    }
}

fn with_glob(dir: &Path) -> String {
    dir.join(RECURSIVE_GLOB).to_string_lossy().into_owned()
}

fn expand(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        for entry in glob::glob(pattern)? {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => warn!("Failed to read resource path under {}: {}", pattern, e),
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn declarations() -> ResourceDeclarations {
        ResourceDeclarations {
            migrations: Some("database/migrations".to_string()),
            seeders: Some("database/seeders".to_string()),
            models: Some("src/models".to_string()),
            config: None,
            lang: None,
        }
    }

    #[tokio::test]
    async fn test_existing_directories_are_registered() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("database/migrations/2024")).unwrap();
        std::fs::create_dir_all(root.join("database/seeders")).unwrap();
        std::fs::write(root.join("database/migrations/2024/001_posts.sql"), "create").unwrap();
        std::fs::write(root.join("database/migrations/002_tags.sql"), "create").unwrap();

        let aggregator = ResourceAggregator::new();
        aggregator
            .register_plugin_resources("blog", root, &declarations())
            .await;

        let migrations = aggregator.migration_paths().await;
        assert_eq!(migrations.len(), 1);
        assert!(migrations[0].ends_with("**/*"));

        let seeders = aggregator.seeder_paths().await;
        assert_eq!(seeders, vec![root.join("database/seeders").to_string_lossy().into_owned()]);

        // models directory does not exist
        assert!(aggregator.entity_paths().await.is_empty());

        let files = aggregator.expand_migrations().await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(aggregator.expand_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_contents_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let aggregator = ResourceAggregator::new();
        aggregator
            .register_plugin_resources("blog", temp_dir.path(), &declarations())
            .await;

        assert!(aggregator.migration_paths().await.is_empty());
        assert!(aggregator.seeder_paths().await.is_empty());
        assert!(aggregator.entity_paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_declared_files_are_not_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("database")).unwrap();
        std::fs::write(root.join("database/migrations"), "not a directory").unwrap();
        std::fs::create_dir_all(root.join("src/models")).unwrap();

        let aggregator = ResourceAggregator::new();
        aggregator
            .register_plugin_resources("blog", root, &declarations())
            .await;

        assert!(aggregator.migration_paths().await.is_empty());
        assert_eq!(aggregator.entity_paths().await.len(), 1);
    }
}
