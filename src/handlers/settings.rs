// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::owner::OwnerContext,
    models::billing::{BillingProfile, UpdateBillingProfileRequest},
};

// GET /api/settings/billing-profile
#[utoipa::path(
    get,
    path = "/api/settings/billing-profile",
    tag = "Settings",
    responses(
        (status = 200, description = "Late-fee policy of the owner", body = BillingProfile)
    ),
    params(
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn get_billing_profile(
    State(app_state): State<AppState>,
    owner: OwnerContext,
) -> Result<impl IntoResponse, AppError> {
    let profile = app_state.billing_service.profile(owner.0).await?;
    Ok((StatusCode::OK, Json(profile)))
}

// PUT /api/settings/billing-profile
#[utoipa::path(
    put,
    path = "/api/settings/billing-profile",
    tag = "Settings",
    request_body = UpdateBillingProfileRequest,
    responses(
        (status = 200, description = "Saved profile", body = BillingProfile),
        (status = 400, description = "Invalid profile")
    ),
    params(
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn update_billing_profile(
    State(app_state): State<AppState>,
    owner: OwnerContext,
    Json(payload): Json<UpdateBillingProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state.billing_service.save_profile(owner.0, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}
