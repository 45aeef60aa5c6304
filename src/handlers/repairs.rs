// src/handlers/repairs.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::owner::OwnerContext,
    models::repair::{NewRepair, Repair, RepairChange, RepairUpdate},
};

// GET /api/leases/{id}/repairs
#[utoipa::path(
    get,
    path = "/api/leases/{id}/repairs",
    tag = "Repairs",
    responses(
        (status = 200, description = "Repairs of the lease", body = Vec<Repair>),
        (status = 404, description = "Unknown lease")
    ),
    params(
        ("id" = Uuid, Path, description = "Lease id"),
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn list_repairs(
    State(app_state): State<AppState>,
    owner: OwnerContext,
    Path(lease_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.lease_service.get(owner.0, lease_id).await?;

    let repairs = app_state.repair_service.list_repairs(lease_id).await?;
    Ok((StatusCode::OK, Json(repairs)))
}

// POST /api/leases/{id}/repairs
#[utoipa::path(
    post,
    path = "/api/leases/{id}/repairs",
    tag = "Repairs",
    request_body = NewRepair,
    responses(
        (status = 201, description = "Repair filed", body = Repair),
        (status = 404, description = "Unknown lease")
    ),
    params(
        ("id" = Uuid, Path, description = "Lease id"),
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn file_repair(
    State(app_state): State<AppState>,
    owner: OwnerContext,
    Path(lease_id): Path<Uuid>,
    Json(payload): Json<NewRepair>,
) -> Result<impl IntoResponse, AppError> {
    app_state.lease_service.get(owner.0, lease_id).await?;

    let repair = app_state.repair_service.file_repair(lease_id, payload).await?;
    Ok((StatusCode::CREATED, Json(repair)))
}

// PATCH /api/repairs/{id}
#[utoipa::path(
    patch,
    path = "/api/repairs/{id}",
    tag = "Repairs",
    request_body = RepairUpdate,
    responses(
        (status = 200, description = "Repair updated, with the deposit deduction if one ran", body = RepairChange),
        (status = 404, description = "Unknown repair"),
        (status = 409, description = "Status cannot move backwards")
    ),
    params(
        ("id" = Uuid, Path, description = "Repair id")
    )
)]
pub async fn update_repair(
    State(app_state): State<AppState>,
    Path(repair_id): Path<Uuid>,
    Json(payload): Json<RepairUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let change = app_state.repair_service.update_repair(repair_id, payload).await?;
    Ok((StatusCode::OK, Json(change)))
}
