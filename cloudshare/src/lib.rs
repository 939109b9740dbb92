//! CloudShare: submit a file with a short note, browse submissions on a
//! dashboard, and ask a hosted language model for help.

mod app;
pub mod config;
pub mod file_kind;
mod hooks;
pub mod notice;
pub mod record;
pub mod routes;
pub mod services;
pub mod views;
pub mod workflows;

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use share_axum::AxumApp;
use tower_http::cors::{Any, CorsLayer};

pub use config::Backends;
pub use services::adapters::{GeminiAdapter, GeminiConfig};
pub use services::{CloudShareState, ShareParams};
pub use workflows::LanguageModel;

use crate::routes::chat::ChatSessions;
use crate::routes::pages::PagesState;
use crate::views::Views;

/// Build the app from the environment, with the backends it selects.
pub fn build() -> Result<AxumApp<Value, ShareParams>> {
    let ax = app::cloudshare_app()?;
    let backends = Backends::from_config(&ax.app.config_snapshot())?;
    assemble(ax, backends)
}

/// Build the app around the given backends with default settings.
pub fn build_with(backends: Backends) -> Result<AxumApp<Value, ShareParams>> {
    assemble(app::cloudshare_app_from(|_| None), backends)
}

fn assemble(ax: AxumApp<Value, ShareParams>, backends: Backends) -> Result<AxumApp<Value, ShareParams>> {
    let cfg = ax.app.config_snapshot();
    let uploads = config::multipart_config(&cfg);
    let state = Arc::new(CloudShareState::new(
        backends.media,
        backends.documents,
        config::collection(&cfg),
    ));

    let svcs = services::configure(Arc::clone(&state));

    let pages = PagesState {
        app: Arc::clone(&state),
        views: Arc::new(Views::new()?),
        chat_enabled: backends.chat.is_some(),
    };

    let mut ax = ax
        .use_service_with("/submissions", svcs.submissions, routes::upload_layer(&uploads))
        .use_router("/", routes::pages::router(pages, &uploads))
        .use_router("/", routes::media::router(Arc::clone(&state)))
        .service("/health", || async { "ok" });
    services::register_hooks(ax.app.as_ref())?;

    match backends.chat {
        Some(model) => {
            let sessions = ChatSessions::new(model, config::system_instruction(&cfg))
                .max_sessions(config::chat_max_sessions(&cfg));
            ax = ax.use_router("/", routes::chat::router(Arc::new(sessions)));
        }
        None => tracing::info!("chat routes not mounted"),
    }

    Ok(ax.with_cors(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    ))
}
