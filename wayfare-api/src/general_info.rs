use axum::{extract::State, routing::post, Json, Router};
use wayfare_core::enrichment::{enrich_general_info, GeneralInfo, GeneralInfoRequest};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/set-general-info", post(set_general_info))
}

async fn set_general_info(
    State(state): State<AppState>,
    AppJson(request): AppJson<GeneralInfoRequest>,
) -> Result<Json<GeneralInfo>, AppError> {
    let info = enrich_general_info(request, &state.airports)?;
    Ok(Json(info))
}
