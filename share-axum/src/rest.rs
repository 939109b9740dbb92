use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, Method},
    routing::MethodRouter,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use share_core::errors::ShareError;
use share_core::{ServiceCapabilities, ServiceMethodKind, ShareApp};

use crate::{
    params::{FromRestParams, RestParams},
    ShareAxumError, ShareAxumState,
};

type RestQuery = Query<HashMap<String, String>>;

fn map_json_rejection(rejection: JsonRejection) -> ShareAxumError {
    ShareError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into()
}

fn rest_params<P: FromRestParams>(headers: &HeaderMap, query: HashMap<String, String>, method: &str, uri: &axum::http::Uri) -> P {
    P::from_rest_params(RestParams::from_parts("rest", headers, query, method, uri))
}

async fn find<R, P>(
    State(state): State<ShareAxumState<R, P>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Vec<R>>, ShareAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let params = rest_params::<P>(&headers, query, "GET", &uri);
    let svc = state.app.service(&state.service)?;
    Ok(Json(svc.find(params).await?))
}

async fn get<R, P>(
    State(state): State<ShareAxumState<R, P>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<R>, ShareAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let params = rest_params::<P>(&headers, query, "GET", &uri);
    let svc = state.app.service(&state.service)?;
    Ok(Json(svc.get(&id, params).await?))
}

async fn create<R, P>(
    State(state): State<ShareAxumState<R, P>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
    data: Result<Json<R>, JsonRejection>,
) -> Result<Json<R>, ShareAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let Json(data) = data.map_err(map_json_rejection)?;
    let params = rest_params::<P>(&headers, query, "POST", &uri);
    let svc = state.app.service(&state.service)?;
    Ok(Json(svc.create(data, params).await?))
}

async fn remove<R, P>(
    State(state): State<ShareAxumState<R, P>>,
    headers: HeaderMap,
    Query(query): RestQuery,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<R>, ShareAxumError>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let params = rest_params::<P>(&headers, query, "DELETE", &uri);
    let svc = state.app.service(&state.service)?;
    Ok(Json(svc.remove(Some(&id), params).await?))
}

async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> ShareAxumError {
    ShareError::method_not_allowed(format!("Method {method} is not allowed on {}", uri.path())).into()
}

/// REST routes for one service, limited to its capabilities:
///
/// | method | path    | service call |
/// |--------|---------|--------------|
/// | GET    | `/`     | find         |
/// | POST   | `/`     | create       |
/// | GET    | `/{id}` | get          |
/// | DELETE | `/{id}` | remove       |
///
/// Anything else answers with a structured 405.
pub fn service_router<R, P>(
    service_name: Arc<String>,
    app: Arc<ShareApp<R, P>>,
    capabilities: &ServiceCapabilities,
) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let state = ShareAxumState {
        app,
        service: service_name,
    };

    let mut collection: MethodRouter<ShareAxumState<R, P>> = MethodRouter::new();
    if capabilities.allows(ServiceMethodKind::Find) {
        collection = collection.get(find::<R, P>);
    }
    if capabilities.allows(ServiceMethodKind::Create) {
        collection = collection.post(create::<R, P>);
    }

    let mut item: MethodRouter<ShareAxumState<R, P>> = MethodRouter::new();
    if capabilities.allows(ServiceMethodKind::Get) {
        item = item.get(get::<R, P>);
    }
    if capabilities.allows(ServiceMethodKind::Remove) {
        item = item.delete(remove::<R, P>);
    }

    Router::new()
        .route("/", collection.fallback(method_not_allowed))
        .route("/{id}", item.fallback(method_not_allowed))
        .with_state(state)
}
