// src/lib.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc};

/// The full HTTP surface, including the Swagger UI.
pub fn app(app_state: AppState) -> Router {
    let lease_routes = Router::new()
        .route(
            "/",
            post(handlers::leases::create_lease).get(handlers::leases::list_leases),
        )
        .route("/{id}", get(handlers::leases::get_lease))
        .route("/{id}/sign", post(handlers::leases::sign_lease))
        .route("/{id}/invoices", get(handlers::leases::list_lease_invoices))
        .route(
            "/{id}/repairs",
            post(handlers::repairs::file_repair).get(handlers::repairs::list_repairs),
        )
        .route("/{id}/pay/deposit", post(handlers::leases::pay_deposit))
        .route("/{id}/pay/annual", post(handlers::leases::pay_annual_rent));

    let invoice_routes = Router::new()
        .route("/generate-due", post(handlers::invoices::generate_due))
        .route("/{id}/pay-init", get(handlers::invoices::pay_init))
        .route("/{id}/reconcile", patch(handlers::invoices::reconcile_invoice));

    let repair_routes = Router::new().route("/{id}", patch(handlers::repairs::update_repair));

    let settings_routes = Router::new().route(
        "/billing-profile",
        get(handlers::settings::get_billing_profile).put(handlers::settings::update_billing_profile),
    );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/leases", lease_routes)
        .nest("/api/invoices", invoice_routes)
        .nest("/api/repairs", repair_routes)
        .nest("/api/settings", settings_routes)
        .with_state(app_state)
}
