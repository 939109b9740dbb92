use crate::notice::Notice;
use crate::record::Submission;

use super::submission::{FileInput, SubmissionInput, SubmissionWorkflow};

/// State of the submission form on the index page.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub name: String,
    pub message: String,
    pub file: Option<FileInput>,
    pub loading: bool,
    pub notices: Vec<Notice>,
}

impl SubmissionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_input(input: SubmissionInput) -> Self {
        Self {
            name: input.name,
            message: input.message,
            file: input.file,
            ..Self::default()
        }
    }

    fn input(&self) -> SubmissionInput {
        SubmissionInput::new(self.name.clone(), self.message.clone(), self.file.clone())
    }

    fn clear(&mut self) {
        self.name.clear();
        self.message.clear();
        self.file = None;
    }

    /// Run the workflow. Fields are cleared only on success; any failure
    /// keeps them and shows the error instead.
    pub async fn submit(&mut self, workflow: &SubmissionWorkflow) -> Option<Submission> {
        self.loading = true;
        let outcome = workflow.submit(self.input()).await;
        self.loading = false;

        match outcome {
            Ok(submission) => {
                self.clear();
                self.notices.push(Notice::success("Submitted successfully!"));
                Some(submission)
            }
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                None
            }
        }
    }
}
