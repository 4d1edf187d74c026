//! Discovery from the local plugins directory

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::package::sorted_subdirectories;
use super::{Candidate, CandidateKind, DiscoveryStrategy};
use crate::registry::PluginSource;

/// Index file names, in lookup order
pub const INDEX_FILES: [&str; 3] = ["index.yaml", "index.yml", "index.json"];

/// Treats every subdirectory holding an index file as a plugin
pub struct LocalDirectoryScanner {
    plugins_dir: PathBuf,
}

impl LocalDirectoryScanner {
    pub fn new(plugins_dir: PathBuf) -> Self {
        Self { plugins_dir }
    }
}

#[async_trait]
impl DiscoveryStrategy for LocalDirectoryScanner {
    fn name(&self) -> &str {
        "local plugins"
    }

    async fn scan(&self) -> Result<Vec<Candidate>> {
        if !self.plugins_dir.is_dir() {
            debug!("Local plugins directory {:?} does not exist", self.plugins_dir);
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for dir in sorted_subdirectories(&self.plugins_dir).await? {
            let Some(index) = INDEX_FILES
                .iter()
                .map(|file| dir.join(file))
                .find(|path| path.is_file())
            else {
                debug!("No index file in {:?}, skipping", dir);
                continue;
            };

            candidates.push(Candidate {
                root: dir,
                source: PluginSource::Local,
                kind: CandidateKind::Descriptor { path: index },
            });
        }

        Ok(candidates)
    }
}
