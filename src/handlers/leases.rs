// src/handlers/leases.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::owner::OwnerContext,
    models::{
        invoice::InvoiceStanding,
        lease::{CreatedLease, Lease, NewLease, SignLeaseRequest},
        receipt::Reconciliation,
        settlement::{AdHocKind, SettlementConfirmation},
    },
};

// =============================================================================
//  LEASES
// =============================================================================

// POST /api/leases
#[utoipa::path(
    post,
    path = "/api/leases",
    tag = "Leases",
    request_body = NewLease,
    responses(
        (status = 201, description = "Lease created with its first invoice", body = CreatedLease),
        (status = 400, description = "Invalid lease terms")
    ),
    params(
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn create_lease(
    State(app_state): State<AppState>,
    owner: OwnerContext,
    Json(payload): Json<NewLease>,
) -> Result<impl IntoResponse, AppError> {
    let (lease, initial_invoice) = app_state.lease_service.create_lease(owner.0, payload).await?;

    Ok((StatusCode::CREATED, Json(CreatedLease { lease, initial_invoice })))
}

// GET /api/leases
#[utoipa::path(
    get,
    path = "/api/leases",
    tag = "Leases",
    responses(
        (status = 200, description = "Leases of the owner", body = Vec<Lease>)
    ),
    params(
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn list_leases(
    State(app_state): State<AppState>,
    owner: OwnerContext,
) -> Result<impl IntoResponse, AppError> {
    let leases = app_state.lease_service.list(owner.0).await?;
    Ok((StatusCode::OK, Json(leases)))
}

// GET /api/leases/{id}
#[utoipa::path(
    get,
    path = "/api/leases/{id}",
    tag = "Leases",
    responses(
        (status = 200, description = "Lease", body = Lease),
        (status = 404, description = "Unknown lease")
    ),
    params(
        ("id" = Uuid, Path, description = "Lease id"),
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn get_lease(
    State(app_state): State<AppState>,
    owner: OwnerContext,
    Path(lease_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lease = app_state.lease_service.get(owner.0, lease_id).await?;
    Ok((StatusCode::OK, Json(lease)))
}

// POST /api/leases/{id}/sign
#[utoipa::path(
    post,
    path = "/api/leases/{id}/sign",
    tag = "Leases",
    request_body = SignLeaseRequest,
    responses(
        (status = 200, description = "Signature recorded", body = Lease),
        (status = 404, description = "Unknown lease")
    ),
    params(
        ("id" = Uuid, Path, description = "Lease id"),
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn sign_lease(
    State(app_state): State<AppState>,
    owner: OwnerContext,
    Path(lease_id): Path<Uuid>,
    Json(payload): Json<SignLeaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let lease = app_state.lease_service.sign(owner.0, lease_id, payload.party).await?;
    Ok((StatusCode::OK, Json(lease)))
}

// GET /api/leases/{id}/invoices
#[utoipa::path(
    get,
    path = "/api/leases/{id}/invoices",
    tag = "Invoices",
    responses(
        (status = 200, description = "Invoices with late-fee assessment", body = Vec<InvoiceStanding>),
        (status = 404, description = "Unknown lease")
    ),
    params(
        ("id" = Uuid, Path, description = "Lease id"),
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn list_lease_invoices(
    State(app_state): State<AppState>,
    owner: OwnerContext,
    Path(lease_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.lease_service.get(owner.0, lease_id).await?;

    let standings = app_state.invoice_service.standings(lease_id, Utc::now()).await?;
    Ok((StatusCode::OK, Json(standings)))
}

// =============================================================================
//  AD-HOC PAYMENTS (settlement callbacks)
// =============================================================================

// POST /api/leases/{id}/pay/deposit
#[utoipa::path(
    post,
    path = "/api/leases/{id}/pay/deposit",
    tag = "Payments",
    request_body = SettlementConfirmation,
    responses(
        (status = 200, description = "Deposit reconciled", body = Reconciliation),
        (status = 409, description = "Deposit already settled by another transaction")
    ),
    params(
        ("id" = Uuid, Path, description = "Lease id")
    )
)]
pub async fn pay_deposit(
    State(app_state): State<AppState>,
    Path(lease_id): Path<Uuid>,
    Json(payload): Json<SettlementConfirmation>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state
        .reconciler
        .reconcile_ad_hoc_payment(lease_id, AdHocKind::Deposit, &payload)
        .await?;
    Ok((StatusCode::OK, Json(result)))
}

// POST /api/leases/{id}/pay/annual
#[utoipa::path(
    post,
    path = "/api/leases/{id}/pay/annual",
    tag = "Payments",
    request_body = SettlementConfirmation,
    responses(
        (status = 200, description = "Annual rent reconciled", body = Reconciliation),
        (status = 409, description = "Payment already settled by another transaction")
    ),
    params(
        ("id" = Uuid, Path, description = "Lease id")
    )
)]
pub async fn pay_annual_rent(
    State(app_state): State<AppState>,
    Path(lease_id): Path<Uuid>,
    Json(payload): Json<SettlementConfirmation>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state
        .reconciler
        .reconcile_ad_hoc_payment(lease_id, AdHocKind::AnnualRent, &payload)
        .await?;
    Ok((StatusCode::OK, Json(result)))
}
