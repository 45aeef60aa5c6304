// src/handlers/invoices.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::owner::OwnerContext,
    models::{
        invoice::{Invoice, PaymentInstructions},
        receipt::Reconciliation,
        settlement::{ReconcileInvoiceRequest, SettlementRef},
    },
};

// POST /api/invoices/generate-due
#[utoipa::path(
    post,
    path = "/api/invoices/generate-due",
    tag = "Invoices",
    responses(
        (status = 200, description = "Invoices created by this run", body = Vec<Invoice>)
    ),
    params(
        ("x-owner-id" = Uuid, Header, description = "Owner workspace")
    )
)]
pub async fn generate_due(
    State(app_state): State<AppState>,
    owner: OwnerContext,
) -> Result<impl IntoResponse, AppError> {
    let created = app_state.invoice_service.sweep(Some(owner.0), Utc::now()).await?;
    Ok((StatusCode::OK, Json(created)))
}

// GET /api/invoices/{id}/pay-init
#[utoipa::path(
    get,
    path = "/api/invoices/{id}/pay-init",
    tag = "Invoices",
    responses(
        (status = 200, description = "What the tenant wallet must pay", body = PaymentInstructions),
        (status = 404, description = "Unknown invoice")
    ),
    params(
        ("id" = Uuid, Path, description = "Invoice id")
    )
)]
pub async fn pay_init(
    State(app_state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let instructions = app_state.invoice_service.payment_instructions(invoice_id).await?;
    Ok((StatusCode::OK, Json(instructions)))
}

// PATCH /api/invoices/{id}/reconcile
#[utoipa::path(
    patch,
    path = "/api/invoices/{id}/reconcile",
    tag = "Payments",
    request_body = ReconcileInvoiceRequest,
    responses(
        (status = 200, description = "Invoice paid (or already paid by the same transaction)", body = Reconciliation),
        (status = 404, description = "Unknown invoice"),
        (status = 409, description = "Invoice already settled by another transaction")
    ),
    params(
        ("id" = Uuid, Path, description = "Invoice id")
    )
)]
pub async fn reconcile_invoice(
    State(app_state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<ReconcileInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let settlement = SettlementRef::new(payload.chain_id, payload.tx_hash);
    let result = app_state
        .reconciler
        .reconcile_invoice(invoice_id, settlement, payload.paid_amount)
        .await?;
    Ok((StatusCode::OK, Json(result)))
}
