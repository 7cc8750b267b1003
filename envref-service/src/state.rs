use crate::error::AppError;
use envref_core::{enumerate_roots, EnvResolver, ProjectRoot, Rebuild, ScanStats};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;

pub type SharedState = Arc<AppState>;

/// A rebuild as reported to clients
#[derive(Debug, Clone, Serialize)]
pub struct RebuildRecord {
    pub generation: u64,
    /// False when an overlapping, later-started rebuild won
    pub installed: bool,
    pub stats: ScanStats,
    pub finished_at: String,
}

impl From<Rebuild> for RebuildRecord {
    fn from(rebuild: Rebuild) -> Self {
        Self {
            generation: rebuild.generation.value(),
            installed: rebuild.installed,
            stats: rebuild.stats,
            finished_at: timestamp(),
        }
    }
}

pub struct AppState {
    pub resolver: Arc<EnvResolver>,
    pub roots: Vec<ProjectRoot>,
    /// Most recent rebuild that was actually installed
    last_rebuild: RwLock<Option<RebuildRecord>>,
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

impl AppState {
    pub fn new(resolver: EnvResolver, roots: Vec<ProjectRoot>) -> Self {
        Self {
            resolver: Arc::new(resolver),
            roots,
            last_rebuild: RwLock::new(None),
        }
    }

    /// Rescan every root off the async runtime and swap the new index in.
    ///
    /// Roots are checked again first; a root deleted since startup fails the
    /// rebuild instead of silently indexing nothing. Overlapping calls are
    /// allowed; the index keeps whichever started last.
    pub async fn rebuild(&self) -> Result<RebuildRecord, AppError> {
        let resolver = Arc::clone(&self.resolver);
        let paths: Vec<PathBuf> = self.roots.iter().map(|r| r.path.clone()).collect();

        let rebuild = tokio::task::spawn_blocking(move || {
            let roots = enumerate_roots(&paths)?;
            Ok::<_, envref_core::EnvRefError>(resolver.rebuild(&roots))
        })
        .await
        .map_err(|err| AppError::internal(format!("rebuild task failed: {err}")))??;

        let record = RebuildRecord::from(rebuild);
        self.record(&record).await;
        Ok(record)
    }

    /// Remember `record` if it was installed and is newer than what is stored
    async fn record(&self, record: &RebuildRecord) {
        if !record.installed {
            tracing::debug!(generation = record.generation, "rebuild superseded, not recorded");
            return;
        }
        let mut last = self.last_rebuild.write().await;
        if last.as_ref().is_some_and(|l| l.generation >= record.generation) {
            return;
        }
        *last = Some(record.clone());
    }

    pub async fn last_rebuild(&self) -> Option<RebuildRecord> {
        self.last_rebuild.read().await.clone()
    }
}
