use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use share_core::{HookContext, HookResult, ShareAfterHook, ShareBeforeHook, ShareError};

use crate::file_kind::classify_file_kind;
use crate::services::ShareParams;
use crate::workflows::SubmissionInput;

/// Reject incomplete submissions before anything is uploaded.
pub struct ValidateSubmissionFields;

#[async_trait]
impl ShareBeforeHook<Value, ShareParams> for ValidateSubmissionFields {
    async fn run(&self, ctx: &mut HookContext<Value, ShareParams>) -> Result<()> {
        let Some(data) = ctx.data.as_ref() else {
            return Ok(());
        };

        SubmissionInput::from_json(data)
            .and_then(|input| input.validate())
            .map_err(|e| ShareError::from(e).into_anyhow())
    }
}

/// Deletes must carry `confirm=true`.
pub struct RequireDeleteConfirmation;

#[async_trait]
impl ShareBeforeHook<Value, ShareParams> for RequireDeleteConfirmation {
    async fn run(&self, ctx: &mut HookContext<Value, ShareParams>) -> Result<()> {
        if ctx.params.query_flag("confirm") {
            return Ok(());
        }

        Err(ShareError::bad_request("Deletion must be confirmed with confirm=true")
            .with_data(json!({ "id": ctx.id }))
            .into_anyhow())
    }
}

fn with_file_kind(mut v: Value) -> Value {
    let kind = v
        .get("fileUrl")
        .and_then(Value::as_str)
        .map(classify_file_kind);

    if let (Some(kind), Some(obj)) = (kind, v.as_object_mut()) {
        obj.insert("fileKind".to_string(), Value::String(kind.as_str().to_string()));
    }
    v
}

/// Add `fileKind` next to each record's `fileUrl`.
pub struct AttachFileKind;

#[async_trait]
impl ShareAfterHook<Value, ShareParams> for AttachFileKind {
    async fn run(&self, ctx: &mut HookContext<Value, ShareParams>) -> Result<()> {
        let Some(res) = ctx.result.take() else {
            return Ok(());
        };

        ctx.result = Some(match res {
            HookResult::One(v) => HookResult::One(with_file_kind(v)),
            HookResult::Many(vs) => HookResult::Many(vs.into_iter().map(with_file_kind).collect()),
        });

        Ok(())
    }
}
