// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "Lease Ledger API"),
    paths(
        // --- Leases ---
        handlers::leases::create_lease,
        handlers::leases::list_leases,
        handlers::leases::get_lease,
        handlers::leases::sign_lease,

        // --- Invoices ---
        handlers::leases::list_lease_invoices,
        handlers::invoices::generate_due,
        handlers::invoices::pay_init,

        // --- Payments ---
        handlers::leases::pay_deposit,
        handlers::leases::pay_annual_rent,
        handlers::invoices::reconcile_invoice,

        // --- Repairs ---
        handlers::repairs::list_repairs,
        handlers::repairs::file_repair,
        handlers::repairs::update_repair,

        // --- Settings ---
        handlers::settings::get_billing_profile,
        handlers::settings::update_billing_profile,
    ),
    components(
        schemas(
            // --- Leases ---
            models::lease::LeaseStatus,
            models::lease::SigningParty,
            models::lease::Lease,
            models::lease::NewLease,
            models::lease::SignLeaseRequest,
            models::lease::CreatedLease,

            // --- Invoices ---
            models::invoice::InvoiceKind,
            models::invoice::InvoiceStatus,
            models::invoice::Invoice,
            models::invoice::InvoiceStanding,
            models::invoice::PaymentInstructions,

            // --- Payments ---
            models::settlement::SettlementRef,
            models::settlement::SettlementConfirmation,
            models::settlement::ReconcileInvoiceRequest,
            models::receipt::Receipt,
            models::receipt::Reconciliation,

            // --- Repairs ---
            models::repair::RepairStatus,
            models::repair::RepairPriority,
            models::repair::Repair,
            models::repair::NewRepair,
            models::repair::RepairUpdate,
            models::repair::DeductionOutcome,
            models::repair::RepairChange,

            // --- Settings ---
            models::billing::LateFeeType,
            models::billing::BillingProfile,
            models::billing::UpdateBillingProfileRequest,
        )
    ),
    tags(
        (name = "Leases", description = "Lease records and signatures"),
        (name = "Invoices", description = "Rent invoices and late-fee standings"),
        (name = "Payments", description = "Reconciliation of confirmed on-chain payments"),
        (name = "Repairs", description = "Repair requests and deposit deductions"),
        (name = "Settings", description = "Owner billing profile")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/leases",
            "/api/leases/{id}",
            "/api/leases/{id}/sign",
            "/api/leases/{id}/invoices",
            "/api/leases/{id}/repairs",
            "/api/leases/{id}/pay/deposit",
            "/api/leases/{id}/pay/annual",
            "/api/invoices/generate-due",
            "/api/invoices/{id}/pay-init",
            "/api/invoices/{id}/reconcile",
            "/api/repairs/{id}",
            "/api/settings/billing-profile",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing from OpenAPI");
        }
    }
}
