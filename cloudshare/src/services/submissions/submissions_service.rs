use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use share_core::{bail_share, ServiceCapabilities, ShareError, ShareService};
use share_docs::DocumentError;

use crate::record::{valid_submissions, Submission};
use crate::services::{CloudShareState, ShareParams};
use crate::workflows::SubmissionInput;

use super::submissions_shared;

/// REST face of the stored submissions.
pub struct SubmissionsService {
    state: Arc<CloudShareState>,
}

impl SubmissionsService {
    pub fn new(state: Arc<CloudShareState>) -> Self {
        Self { state }
    }
}

fn store_error(e: DocumentError) -> anyhow::Error {
    match e {
        DocumentError::NotFound { ref id, .. } => {
            ShareError::not_found(format!("Submission not found: {id}")).into_anyhow()
        }
        DocumentError::Invalid { ref message } => ShareError::bad_request(message.clone()).into_anyhow(),
        other => ShareError::bad_gateway("Document store request failed")
            .with_source(other)
            .into_anyhow(),
    }
}

#[async_trait]
impl ShareService<Value, ShareParams> for SubmissionsService {
    fn capabilities(&self) -> ServiceCapabilities {
        submissions_shared::capabilities()
    }

    async fn find(&self, _params: ShareParams) -> Result<Vec<Value>> {
        let collection = self.state.collection();
        let docs = self.state.documents.list(collection).await.map_err(store_error)?;

        valid_submissions(collection, docs)
            .iter()
            .map(|s| serde_json::to_value(s).map_err(Into::into))
            .collect()
    }

    async fn get(&self, id: &str, _params: ShareParams) -> Result<Value> {
        let doc = self
            .state
            .documents
            .get(self.state.collection(), id)
            .await
            .map_err(store_error)?;

        let submission = Submission::try_from(doc).map_err(|e| {
            tracing::warn!(id, error = %e, "stored submission is malformed");
            ShareError::not_found(format!("Submission not found: {id}")).into_anyhow()
        })?;

        Ok(serde_json::to_value(submission)?)
    }

    async fn create(&self, data: Value, _params: ShareParams) -> Result<Value> {
        let input = SubmissionInput::from_json(&data).map_err(|e| ShareError::from(e).into_anyhow())?;
        let submission = self
            .state
            .workflow
            .submit(input)
            .await
            .map_err(|e| ShareError::from(e).into_anyhow())?;

        Ok(serde_json::to_value(submission)?)
    }

    /// Returns the removed record. The media object is left in place.
    async fn remove(&self, id: Option<&str>, params: ShareParams) -> Result<Value> {
        let Some(id) = id else {
            bail_share!(bad_request, "Removing every submission is not supported");
        };

        let existing = self.get(id, params).await?;
        self.state
            .documents
            .delete(self.state.collection(), id)
            .await
            .map_err(store_error)?;

        tracing::info!(id, "submission removed");
        Ok(existing)
    }
}
