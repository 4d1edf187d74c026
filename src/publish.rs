//! Copying plugin-provided publishable resources into the application

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::registry::PluginRegistry;
use crate::utils::{copy_file, file_pairs};

/// Outcome of a publish run, as destination paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Copies publishable resources from plugin roots to a base directory
pub struct Publisher {
    registry: Arc<PluginRegistry>,
    base_directory: PathBuf,
}

impl Publisher {
    pub fn new(registry: Arc<PluginRegistry>, base_directory: PathBuf) -> Self {
        Self {
            registry,
            base_directory,
        }
    }

    /// Publish every resource, or only those carrying `tag`
    ///
    /// Sources resolve against the owning plugin root and destinations against
    /// the base directory. Existing destination files are kept unless `force`.
    /// A file that cannot be copied is logged and recorded as failed.
    pub async fn publish(&self, tag: Option<&str>, force: bool) -> Result<PublishReport> {
        let mut report = PublishReport::default();

        for resource in self.registry.publishable_resources(tag).await {
            let Some(root) = self.registry.plugin_root(&resource.plugin).await else {
                warn!(
                    "Plugin {} has no known root, skipping publish of {}",
                    resource.plugin, resource.source
                );
                continue;
            };

            let source = root.join(&resource.source);
            let destination = self.base_directory.join(&resource.destination);

            let pairs = match file_pairs(&source, &destination) {
                Ok(pairs) => pairs,
                Err(e) => {
                    warn!("Cannot publish {} from {}: {}", resource.source, resource.plugin, e);
                    continue;
                }
            };

            for (from, to) in pairs {
                if to.exists() && !force {
                    debug!("Keeping existing {:?}", to);
                    report.skipped.push(to);
                    continue;
                }

                match copy_file(&from, &to) {
                    Ok(()) => report.copied.push(to),
                    Err(e) => {
                        warn!("Cannot publish {:?} from {}: {:#}", from, resource.plugin, e);
                        report.failed.push(to);
                    }
                }
            }
        }

        info!(
            "Published {} file(s), skipped {}, failed {}",
            report.copied.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::registry::PluginSource;
    use plugin_host_api::{PluginDescriptor, PublishSpec, StandaloneHost};
    use std::fs;
    use tempfile::TempDir;

    async fn setup(temp_dir: &TempDir) -> Publisher {
        let root = temp_dir.path().join("plugins/blog");
        fs::create_dir_all(root.join("config")).unwrap();
        fs::create_dir_all(root.join("views/posts")).unwrap();
        fs::write(root.join("config/blog.yaml"), "per_page: 10").unwrap();
        fs::write(root.join("views/posts/index.html"), "<ul></ul>").unwrap();

        let registry = Arc::new(PluginRegistry::new(
            Arc::new(StandaloneHost::new()),
            Arc::new(EventBus::new()),
        ));
        registry.set_plugin_root("blog", root).await;
        registry
            .register(
                PluginDescriptor::new("blog", "1.0.0")
                    .with_publishable(PublishSpec::new("config/blog.yaml", "config/blog.yaml", "config"))
                    .with_publishable(PublishSpec::new("views", "resources/views/blog", "views")),
                PluginSource::Manual,
            )
            .await;
        registry
            .register(
                PluginDescriptor::new("rootless", "1.0.0")
                    .with_publishable(PublishSpec::new("a.txt", "a.txt", "config")),
                PluginSource::Manual,
            )
            .await;

        Publisher::new(registry, temp_dir.path().join("app"))
    }

    #[tokio::test]
    async fn test_publish_copies_files_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let publisher = setup(&temp_dir).await;
        let app = temp_dir.path().join("app");

        let report = publisher.publish(None, false).await.unwrap();

        assert_eq!(
            report.copied,
            vec![
                app.join("config/blog.yaml"),
                app.join("resources/views/blog/posts/index.html"),
            ]
        );
        assert!(report.skipped.is_empty());
        assert!(app.join("resources/views/blog/posts/index.html").is_file());
    }

    #[tokio::test]
    async fn test_publish_filters_by_tag_and_respects_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let publisher = setup(&temp_dir).await;
        let target = temp_dir.path().join("app/config/blog.yaml");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "customised").unwrap();

        let report = publisher.publish(Some("config"), false).await.unwrap();
        assert!(report.copied.is_empty());
        assert_eq!(report.skipped, vec![target.clone()]);
        assert_eq!(fs::read_to_string(&target).unwrap(), "customised");

        let report = publisher.publish(Some("config"), true).await.unwrap();
        assert_eq!(report.copied, vec![target.clone()]);
        assert_eq!(fs::read_to_string(&target).unwrap(), "per_page: 10");
    }

    #[tokio::test]
    async fn test_failed_copy_does_not_abort_publish() {
        let temp_dir = TempDir::new().unwrap();
        let publisher = setup(&temp_dir).await;
        let app = temp_dir.path().join("app");
        // a file where the config directory should be
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("config"), "not a directory").unwrap();

        let report = publisher.publish(None, false).await.unwrap();

        assert_eq!(report.failed, vec![app.join("config/blog.yaml")]);
        assert_eq!(
            report.copied,
            vec![app.join("resources/views/blog/posts/index.html")]
        );
        assert!(report.skipped.is_empty());
    }
}
