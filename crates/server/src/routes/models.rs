use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use bench_core::{ModelDescriptor, Provider, ProviderCatalogue};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct SupportedModelsResponse {
    /// Models every session runs, in execution order.
    pub models: Vec<ModelDescriptor>,
    pub providers: BTreeMap<String, ProviderCatalogue>,
}

#[utoipa::path(
    get,
    path = "/api/supported-models",
    responses(
        (status = 200, description = "Configured models and provider catalogue", body = SupportedModelsResponse)
    ),
    tag = "models"
)]
pub async fn supported_models(State(state): State<AppState>) -> Json<SupportedModelsResponse> {
    let providers = Provider::ALL
        .iter()
        .map(|p| (p.as_str().to_string(), p.catalogue()))
        .collect();

    Json(SupportedModelsResponse {
        models: state.models.as_ref().clone(),
        providers,
    })
}
