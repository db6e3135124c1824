//! Approval flags stored inside the fallback dataset file
//!
//! Flipping a flag rewrites the matching record's `approved` field and saves
//! the document pretty-printed. The new document goes to a sibling temp file
//! that is renamed over the dataset, so readers never see a partial file.
//! Records without an id are addressed by their position, the same way the
//! normalizer numbers them.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ApprovalOutcome, ApprovalStore};
use crate::dataset::{load_dataset, records, records_mut};
use crate::model::ReviewId;
use crate::source::ReviewSource;
use crate::{Error, Result};

/// Approval store backed by the dataset JSON file
pub struct JsonFileApprovalStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl JsonFileApprovalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Same directory as the dataset so the rename stays on one filesystem
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn record_id(record: &Value, position: usize) -> ReviewId {
    record
        .get("id")
        .and_then(ReviewId::from_json)
        .unwrap_or_else(|| ReviewId::from_position(position))
}

#[async_trait]
impl ApprovalStore for JsonFileApprovalStore {
    fn backend(&self) -> &'static str {
        "json-file"
    }

    // Ids in the dataset file only identify fallback reviews
    fn covers(&self, source: ReviewSource) -> bool {
        source == ReviewSource::Fallback
    }

    async fn set_approved(&self, id: &ReviewId, approved: bool) -> Result<ApprovalOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut document = load_dataset(&self.path).await?;
        let list = records_mut(&mut document).ok_or_else(|| {
            Error::Config(format!(
                "review dataset {} has no record list",
                self.path.display()
            ))
        })?;

        let Some(record) = list
            .iter_mut()
            .enumerate()
            .find(|(position, record)| &record_id(record, *position) == id)
            .map(|(_, record)| record)
        else {
            debug!(id = %id, "Approval update for unknown review");
            return Ok(ApprovalOutcome::NotFound);
        };

        match record.as_object_mut() {
            Some(fields) => {
                fields.insert("approved".to_string(), Value::Bool(approved));
            }
            None => return Ok(ApprovalOutcome::NotFound),
        }

        let serialized = serde_json::to_string_pretty(&document)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, serialized).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        info!(id = %id, approved, path = %self.path.display(), "Review approval updated");
        Ok(ApprovalOutcome::Updated)
    }

    async fn approvals(&self) -> Result<HashMap<ReviewId, bool>> {
        let document = load_dataset(&self.path).await?;

        Ok(records(&document)
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let approved = record
                    .get("approved")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                (record_id(record, position), approved)
            })
            .collect())
    }
}
