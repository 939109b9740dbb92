use std::sync::Arc;

use serde_json::Value;
use share_core::{ServiceCapabilities, ServiceMethodKind, ShareApp};

use crate::services::ShareParams;

use super::submissions_hooks::{AttachFileKind, RequireDeleteConfirmation, ValidateSubmissionFields};

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Create,
        ServiceMethodKind::Remove,
    ])
}

pub fn register_hooks(app: &ShareApp<Value, ShareParams>) -> anyhow::Result<()> {
    app.service("submissions")?.hooks(|h| {
        h.before_create(Arc::new(ValidateSubmissionFields));
        h.before_remove(Arc::new(RequireDeleteConfirmation));

        h.after_find(Arc::new(AttachFileKind));
        h.after(ServiceMethodKind::Get, Arc::new(AttachFileKind));
    });
    Ok(())
}
