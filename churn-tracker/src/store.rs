use crate::snapshot::Snapshot;
use churn_common::{ChurnError, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// JSON document store for the account [`Snapshot`].
///
/// `load` never fails: a missing or unreadable document is a first run. `save` replaces
/// the document atomically (write to a sibling temp file, then rename over the target),
/// so a failed write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Snapshot {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                tracing::debug!(
                    path=%self.path.display(),
                    success_count=snapshot.success_count,
                    followers=snapshot.follower_ids.len(),
                    "store.loaded"
                );
                snapshot
            }
            Ok(None) => {
                tracing::info!(path=%self.path.display(), "store.missing_first_run");
                Snapshot::default()
            }
            Err(err) => {
                tracing::warn!(error=%err, "store.unparsable_first_run");
                Snapshot::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<Snapshot>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ChurnError::StateParse {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ChurnError::StateParse {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = render(snapshot).map_err(|source| self.write_error(source))?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|source| self.write_error(source))?;
        tmp.write_all(&bytes)
            .map_err(|source| self.write_error(source))?;
        tmp.as_file()
            .sync_all()
            .map_err(|source| self.write_error(source))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        tracing::info!(
            path=%self.path.display(),
            success_count=snapshot.success_count,
            followers=snapshot.follower_ids.len(),
            bytes=bytes.len(),
            "store.save"
        );
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> ChurnError {
        ChurnError::StateWrite {
            path: self.path.clone(),
            source,
        }
    }
}

/// Four-space indented JSON with a trailing newline.
fn render(snapshot: &Snapshot) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    snapshot.serialize(&mut ser).map_err(std::io::Error::other)?;
    out.push(b'\n');
    Ok(out)
}
