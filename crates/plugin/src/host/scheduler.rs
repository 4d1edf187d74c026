//! Scheduler collaborator

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Body of a scheduled job
pub type JobTask = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A job registered with the host scheduler
#[derive(Clone)]
pub struct ScheduledJob {
    /// Unique job name
    pub name: String,

    /// Schedule expression, interpreted by the scheduler implementation
    pub expression: String,

    /// Job body
    pub task: JobTask,
}

impl ScheduledJob {
    pub fn new<F>(name: impl Into<String>, expression: impl Into<String>, task: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            expression: expression.into(),
            task: Arc::new(task),
        }
    }
}

impl fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("name", &self.name)
            .field("expression", &self.expression)
            .finish()
    }
}

/// Scheduler service resolvable from the host
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn add_job(&self, job: ScheduledJob) -> Result<()>;

    async fn job_names(&self) -> Vec<String>;
}

/// In-memory scheduler that keeps jobs and runs them on demand
#[derive(Debug, Default)]
pub struct StandaloneScheduler {
    jobs: RwLock<Vec<ScheduledJob>>,
}

impl StandaloneScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a job by name
    pub async fn trigger(&self, name: &str) -> Result<()> {
        let task = {
            let jobs = self.jobs.read().await;
            jobs.iter()
                .find(|job| job.name == name)
                .map(|job| Arc::clone(&job.task))
                .ok_or_else(|| anyhow!("No scheduled job named {}", name))?
        };
        task().await
    }
}

#[async_trait]
impl Scheduler for StandaloneScheduler {
    async fn add_job(&self, job: ScheduledJob) -> Result<()> {
        if job.expression.trim().is_empty() {
            return Err(anyhow!("Job {} has an empty schedule expression", job.name));
        }

        let mut jobs = self.jobs.write().await;
        if jobs.iter().any(|existing| existing.name == job.name) {
            return Err(anyhow!("Job {} is already scheduled", job.name));
        }
        jobs.push(job);
        Ok(())
    }

    async fn job_names(&self) -> Vec<String> {
        self.jobs.read().await.iter().map(|job| job.name.clone()).collect()
    }
}
