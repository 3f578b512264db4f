//! Scoped lifecycle for the on-disk files produced during one pipeline run.
//!
//! A [`TempArtifactManager`] owns the process-private scratch directory. Each run opens an
//! [`ArtifactScope`] and acquires its artifacts through it; the scope releases everything it
//! handed out, either explicitly through [`ArtifactScope::release_all`] or, if the run was
//! cancelled or panicked before reaching that point, synchronously when it is dropped.
//!
//! Release failures never fail a run: they come back as [`CleanupWarning`]s and are logged.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};
use vidpress_core::{IngestError, IngestResult};

const MAX_NAME_LEN: usize = 128;
const MAX_COLLISION_RETRIES: usize = 100;

/// Lifecycle of a temporary artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Created,
    InUse,
    Released,
}

/// A temp file could not be deleted. Logged, never escalated.
#[derive(Debug, Clone)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub message: String,
}

impl Display for CleanupWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "failed to delete temp artifact {}: {}",
            self.path.display(),
            self.message
        )
    }
}

/// Acquisition and release counts across every scope of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArtifactStats {
    pub acquired: usize,
    pub released: usize,
}

impl ArtifactStats {
    pub fn outstanding(&self) -> usize {
        self.acquired.saturating_sub(self.released)
    }
}

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// A file in the scratch directory owned by exactly one run.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    state: ArtifactState,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> ArtifactState {
        self.state
    }

    /// Persist `bytes`, replacing any previous content.
    pub async fn write(&mut self, bytes: &[u8]) -> IngestResult<()> {
        self.ensure_live()?;
        fs::write(&self.path, bytes).await.map_err(|e| {
            IngestError::Internal(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        self.state = ArtifactState::InUse;
        Ok(())
    }

    /// Stream `reader` to the file until EOF and return the number of bytes written.
    pub async fn write_from<R>(&mut self, reader: &mut R) -> IngestResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.ensure_live()?;
        let mut file = fs::File::create(&self.path).await.map_err(|e| {
            IngestError::Internal(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        // Writing has started; from here on the artifact is in use even if the copy fails.
        self.state = ArtifactState::InUse;

        let written = tokio::io::copy(reader, &mut file).await.map_err(|e| {
            IngestError::Internal(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        file.flush().await?;

        Ok(written)
    }

    /// Mark a file produced by an external tool as in use.
    pub fn mark_in_use(&mut self) {
        if self.state != ArtifactState::Released {
            self.state = ArtifactState::InUse;
        }
    }

    /// Delete the underlying file. Idempotent; a file that never came into existence counts as
    /// released.
    async fn release(&mut self) -> Result<(), CleanupWarning> {
        if self.state == ArtifactState::Released {
            return Ok(());
        }
        self.state = ArtifactState::Released;

        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CleanupWarning {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn release_blocking(&mut self) -> Result<(), CleanupWarning> {
        if self.state == ArtifactState::Released {
            return Ok(());
        }
        self.state = ArtifactState::Released;

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CleanupWarning {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn ensure_live(&self) -> IngestResult<()> {
        if self.state == ArtifactState::Released {
            return Err(IngestError::Internal(format!(
                "Temp artifact {} was already released",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// Handle to an artifact inside an [`ArtifactScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactId(usize);

/// Owns the scratch directory shared by all runs of this process.
#[derive(Debug, Clone)]
pub struct TempArtifactManager {
    scratch_dir: PathBuf,
    counters: Arc<Counters>,
}

impl TempArtifactManager {
    /// Create (or reuse) the process-private directory `vidpress-<pid>` under `scratch_root`.
    pub fn new(scratch_root: impl AsRef<Path>) -> IngestResult<Self> {
        let scratch_dir = scratch_root
            .as_ref()
            .join(format!("vidpress-{}", std::process::id()));

        std::fs::create_dir_all(&scratch_dir).map_err(|e| {
            IngestError::Internal(format!(
                "Failed to create scratch directory {}: {}",
                scratch_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            scratch_dir,
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Open a scope for one run.
    pub fn scope(&self) -> ArtifactScope {
        ArtifactScope {
            scratch_dir: self.scratch_dir.clone(),
            counters: Arc::clone(&self.counters),
            artifacts: Vec::new(),
        }
    }

    pub fn stats(&self) -> ArtifactStats {
        ArtifactStats {
            acquired: self.counters.acquired.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
        }
    }
}

/// The set of artifacts acquired by one run.
#[derive(Debug)]
pub struct ArtifactScope {
    scratch_dir: PathBuf,
    counters: Arc<Counters>,
    artifacts: Vec<TempArtifact>,
}

impl ArtifactScope {
    /// Create an empty file at a unique path derived from `suggested_name`.
    pub async fn acquire(&mut self, suggested_name: &str) -> IngestResult<ArtifactId> {
        let name = sanitize_name(suggested_name);
        let (stem, extension) = split_name(&name);

        for attempt in 0..MAX_COLLISION_RETRIES {
            let candidate = if attempt == 0 {
                name.clone()
            } else {
                match extension {
                    Some(ext) => format!("{}-{}.{}", stem, attempt, ext),
                    None => format!("{}-{}", stem, attempt),
                }
            };
            let path = self.scratch_dir.join(&candidate);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => {
                    tracing::debug!(path = %path.display(), "Temp artifact acquired");
                    return Ok(self.register(path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(IngestError::Internal(format!(
                        "Failed to create temp artifact {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(IngestError::Internal(format!(
            "Could not find a free temp path for {}",
            name
        )))
    }

    /// Take ownership of a path that an external tool is about to create.
    pub fn adopt(&mut self, path: PathBuf) -> ArtifactId {
        tracing::debug!(path = %path.display(), "Temp artifact adopted");
        self.register(path)
    }

    pub fn get(&self, id: ArtifactId) -> &TempArtifact {
        &self.artifacts[id.0]
    }

    pub fn get_mut(&mut self, id: ArtifactId) -> &mut TempArtifact {
        &mut self.artifacts[id.0]
    }

    pub fn path(&self, id: ArtifactId) -> &Path {
        self.get(id).path()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Release a single artifact. Releasing twice is a no-op.
    pub async fn release(&mut self, id: ArtifactId) -> Result<(), CleanupWarning> {
        let artifact = &mut self.artifacts[id.0];
        if artifact.state() == ArtifactState::Released {
            return Ok(());
        }

        let result = artifact.release().await;
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        if let Err(ref warning) = result {
            tracing::warn!(path = %warning.path.display(), error = %warning.message, "Temp artifact cleanup failed");
        }
        result
    }

    /// Release every artifact not yet released and return the warnings that came up.
    pub async fn release_all(&mut self) -> Vec<CleanupWarning> {
        let mut warnings = Vec::new();

        for index in 0..self.artifacts.len() {
            if let Err(warning) = self.release(ArtifactId(index)).await {
                warnings.push(warning);
            }
        }

        warnings
    }

    fn register(&mut self, path: PathBuf) -> ArtifactId {
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        self.artifacts.push(TempArtifact {
            path,
            state: ArtifactState::Created,
        });
        ArtifactId(self.artifacts.len() - 1)
    }
}

impl Drop for ArtifactScope {
    fn drop(&mut self) {
        for artifact in self.artifacts.iter_mut() {
            if artifact.state() == ArtifactState::Released {
                continue;
            }
            let result = artifact.release_blocking();
            self.counters.released.fetch_add(1, Ordering::SeqCst);
            match result {
                Ok(()) => {
                    tracing::debug!(path = %artifact.path().display(), "Temp artifact released on drop")
                }
                Err(warning) => {
                    tracing::warn!(path = %warning.path.display(), error = %warning.message, "Temp artifact cleanup failed")
                }
            }
        }
    }
}

/// Restrict a suggested name to `[A-Za-z0-9._-]` and a single path segment.
fn sanitize_name(suggested: &str) -> String {
    let base = Path::new(suggested)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(suggested);

    let cleaned: String = base
        .chars()
        .take(MAX_NAME_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.').replace("..", "_");
    if cleaned.is_empty() {
        "artifact".to_string()
    } else {
        cleaned
    }
}

fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}
