//! Discovery from installed package manifests

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{Candidate, CandidateKind, DiscoveryStrategy};
use crate::registry::PluginSource;

/// Package manifest file name
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Scans a packages directory, including one level of `@scope/` directories,
/// for package manifests carrying the plugin manifest key
pub struct PackageScanner {
    packages_dir: PathBuf,
    manifest_key: String,
}

impl PackageScanner {
    pub fn new(packages_dir: PathBuf, manifest_key: impl Into<String>) -> Self {
        Self {
            packages_dir,
            manifest_key: manifest_key.into(),
        }
    }

    async fn package_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();

        for dir in sorted_subdirectories(&self.packages_dir).await? {
            let is_scope = dir
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('@'));

            if is_scope {
                dirs.extend(sorted_subdirectories(&dir).await?);
            } else {
                dirs.push(dir);
            }
        }

        Ok(dirs)
    }

    async fn inspect(&self, package_dir: &Path) -> Result<Option<Candidate>> {
        let manifest_path = package_dir.join(PACKAGE_MANIFEST);
        if !manifest_path.is_file() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&manifest_path)
            .await
            .with_context(|| format!("Failed to read {:?}", manifest_path))?;
        let manifest: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", manifest_path))?;

        let Some(section) = manifest.get(&self.manifest_key).and_then(Value::as_object) else {
            return Ok(None);
        };

        let entry = section
            .get("entry")
            .or_else(|| section.get("main"))
            .and_then(Value::as_str);

        let kind = if let Some(entry) = entry {
            CandidateKind::Descriptor {
                path: package_dir.join(entry),
            }
        } else if let Some(provider) = section.get("provider").and_then(Value::as_str) {
            CandidateKind::LegacyProvider {
                package: string_field(&manifest, "name").unwrap_or_else(|| dir_name(package_dir)),
                version: string_field(&manifest, "version").unwrap_or_else(|| "0.0.0".to_string()),
                provider: provider.to_string(),
            }
        } else {
            debug!(
                "Package {:?} has a {} section without entry or provider",
                package_dir, self.manifest_key
            );
            return Ok(None);
        };

        Ok(Some(Candidate {
            root: package_dir.to_path_buf(),
            source: PluginSource::AutoDiscover,
            kind,
        }))
    }
}

#[async_trait]
impl DiscoveryStrategy for PackageScanner {
    fn name(&self) -> &str {
        "installed packages"
    }

    async fn scan(&self) -> Result<Vec<Candidate>> {
        if !self.packages_dir.is_dir() {
            debug!("Packages directory {:?} does not exist", self.packages_dir);
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for package_dir in self.package_dirs().await? {
            match self.inspect(&package_dir).await {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => warn!("Skipping package {:?}: {:#}", package_dir, e),
            }
        }

        Ok(candidates)
    }
}

fn string_field(manifest: &Value, field: &str) -> Option<String> {
    manifest.get(field).and_then(Value::as_str).map(str::to_string)
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Immediate subdirectories of `dir`, sorted by path
pub(crate) async fn sorted_subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory {:?}", dir))?;

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }

    dirs.sort();
    Ok(dirs)
}
