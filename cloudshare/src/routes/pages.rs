use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use minijinja::context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use share_axum::middlewares::MultipartConfig;
use share_axum::ShareAxumError;

use crate::notice::Notice;
use crate::services::CloudShareState;
use crate::views::Views;
use crate::workflows::{Dashboard, DashboardEntry, SubmissionForm, SubmissionInput};

use super::upload_layer;

#[derive(Clone)]
pub struct PagesState {
    pub app: Arc<CloudShareState>,
    pub views: Arc<Views>,
    pub chat_enabled: bool,
}

pub fn router(state: PagesState, uploads: &MultipartConfig) -> Router<()> {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/{id}/delete", post(delete))
        .layer(upload_layer(uploads))
        .with_state(state)
}

#[derive(Serialize)]
struct FormView<'a> {
    name: &'a str,
    message: &'a str,
    file_name: Option<&'a str>,
    file_size_mb: Option<String>,
    loading: bool,
}

impl<'a> From<&'a SubmissionForm> for FormView<'a> {
    fn from(form: &'a SubmissionForm) -> Self {
        let file = form.file.as_ref();
        Self {
            name: &form.name,
            message: &form.message,
            file_name: file.map(|f| f.filename.as_str()),
            file_size_mb: file.map(|f| format!("{:.2}", f.size() as f64 / (1024.0 * 1024.0))),
            loading: form.loading,
        }
    }
}

fn render_index(state: &PagesState, form: &SubmissionForm) -> Result<Html<String>, ShareAxumError> {
    let html = state.views.render(
        "index.html",
        context! {
            form => FormView::from(form),
            notices => &form.notices,
            chat_enabled => state.chat_enabled,
        },
    )?;
    Ok(Html(html))
}

fn render_dashboard(state: &PagesState, dash: &Dashboard) -> Result<Html<String>, ShareAxumError> {
    let entries: Vec<DashboardEntry> = dash.entries();
    let html = state.views.render(
        "dashboard.html",
        context! {
            entries => entries,
            loading => dash.loading,
            notices => &dash.notices,
        },
    )?;
    Ok(Html(html))
}

async fn index(State(state): State<PagesState>) -> Result<Html<String>, ShareAxumError> {
    render_index(&state, &SubmissionForm::new())
}

async fn submit(
    State(state): State<PagesState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Html<String>, ShareAxumError> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            // Nothing usable arrived; the workflow reports the missing fields.
            tracing::debug!(error = %rejection, "submission form body was not multipart");
            Value::Null
        }
    };

    let mut form = match SubmissionInput::from_json(&body) {
        Ok(input) => SubmissionForm::from_input(input),
        Err(e) => {
            let text = |key: &str| body.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
            let mut form = SubmissionForm::new();
            form.name = text("name");
            form.message = text("message");
            form.notices.push(Notice::error(e.to_string()));
            return render_index(&state, &form);
        }
    };

    form.submit(&state.app.workflow).await;
    render_index(&state, &form)
}

async fn dashboard(State(state): State<PagesState>) -> Result<Html<String>, ShareAxumError> {
    let mut dash = Dashboard::new(Arc::clone(&state.app.documents), state.app.collection());
    dash.load().await;
    render_dashboard(&state, &dash)
}

#[derive(Debug, Default, Deserialize)]
struct DeleteForm {
    #[serde(default)]
    confirm: String,
}

async fn delete(
    State(state): State<PagesState>,
    Path(id): Path<String>,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> Result<Html<String>, ShareAxumError> {
    let confirmed = form.map(|Form(f)| f.confirm == "yes").unwrap_or(false);

    let mut dash = Dashboard::new(Arc::clone(&state.app.documents), state.app.collection());
    dash.load().await;
    dash.delete(&id, confirmed).await;
    render_dashboard(&state, &dash)
}
