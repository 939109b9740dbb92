use std::sync::Arc;

use share_docs::DocumentStore;
use share_media::MediaStore;

use crate::workflows::SubmissionWorkflow;

pub type ShareParams = share_axum::params::RestParams;

/// Store handles shared by services and page routes.
pub struct CloudShareState {
    pub media: Arc<dyn MediaStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub workflow: SubmissionWorkflow,
}

impl CloudShareState {
    pub fn new(media: Arc<dyn MediaStore>, documents: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        let workflow = SubmissionWorkflow::new(Arc::clone(&media), Arc::clone(&documents), collection);
        Self {
            media,
            documents,
            workflow,
        }
    }

    pub fn collection(&self) -> &str {
        self.workflow.collection()
    }
}
