use std::sync::Arc;

use serde::Serialize;
use share_docs::DocumentStore;

use crate::file_kind::{FileKind, Presentation};
use crate::notice::Notice;
use crate::record::{valid_submissions, Submission};

/// One dashboard card.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardEntry {
    pub id: String,
    pub name: String,
    pub message: String,
    pub file_url: String,
    pub date: Option<String>,
    pub kind: FileKind,
    pub presentation: Presentation,
}

impl From<&Submission> for DashboardEntry {
    fn from(s: &Submission) -> Self {
        let kind = s.file_kind();
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            message: s.message.clone(),
            file_url: s.file_url.clone(),
            date: s.display_date(),
            kind,
            presentation: kind.presentation(),
        }
    }
}

/// Listing view state. Fetch and delete failures are logged, never shown.
pub struct Dashboard {
    documents: Arc<dyn DocumentStore>,
    collection: String,
    pub records: Vec<Submission>,
    pub loading: bool,
    pub notices: Vec<Notice>,
}

impl Dashboard {
    pub fn new(documents: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            documents,
            collection: collection.into(),
            records: Vec::new(),
            loading: true,
            notices: Vec::new(),
        }
    }

    pub async fn load(&mut self) {
        match self.documents.list(&self.collection).await {
            Ok(docs) => self.records = valid_submissions(&self.collection, docs),
            Err(e) => tracing::error!(error = %e, collection = %self.collection, "fetching submissions failed"),
        }
        self.loading = false;
    }

    /// Delete a record once the visitor confirmed. Returns whether it was
    /// removed.
    pub async fn delete(&mut self, id: &str, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }

        let name = self
            .records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| id.to_string());

        match self.documents.delete(&self.collection, id).await {
            Ok(()) => {
                self.records.retain(|r| r.id != id);
                self.notices.push(Notice::success(format!("{name} deleted successfully!")));
                true
            }
            Err(e) => {
                tracing::error!(error = %e, id, "deleting submission failed");
                false
            }
        }
    }

    pub fn entries(&self) -> Vec<DashboardEntry> {
        self.records.iter().map(DashboardEntry::from).collect()
    }
}
