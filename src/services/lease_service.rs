// src/services/lease_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::store::LedgerStore,
    models::{
        invoice::Invoice,
        lease::{Lease, LeaseStatus, NewLease, SigningParty},
    },
    services::invoice_service::InvoiceService,
};

#[derive(Clone)]
pub struct LeaseService {
    store: Arc<dyn LedgerStore>,
}

impl LeaseService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    fn check_terms(payload: &NewLease) -> Result<(), AppError> {
        payload.validate()?;

        if payload.start_at >= payload.end_at {
            return Err(AppError::Validation("lease must start before it ends".into()));
        }
        let amounts = [
            ("monthlyRent", payload.monthly_rent),
            ("annualRent", payload.annual_rent),
            ("securityDeposit", payload.security_deposit),
        ];
        if let Some((field, _)) = amounts.iter().find(|(_, value)| *value < Decimal::ZERO) {
            return Err(AppError::Validation(format!("{field} must not be negative")));
        }
        Ok(())
    }

    /// Creates a pending lease together with its first rent invoice.
    pub async fn create_lease(&self, owner_id: Uuid, payload: NewLease) -> Result<(Lease, Invoice), AppError> {
        Self::check_terms(&payload)?;

        let now = Utc::now();
        let lease = Lease {
            id: Uuid::new_v4(),
            property_ref: payload.property_ref,
            owner_id,
            tenant_id: payload.tenant_id,
            tenant_wallet: payload.tenant_wallet,
            start_at: payload.start_at,
            end_at: payload.end_at,
            due_day: payload.due_day,
            monthly_rent: payload.monthly_rent,
            annual_rent: payload.annual_rent,
            security_deposit: payload.security_deposit,
            deposit_balance: Decimal::ZERO,
            status: LeaseStatus::Pending,
            owner_signed_at: None,
            tenant_signed_at: None,
            chain_id: payload.chain_id,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_lease(&lease).await?;
        let profile = tx.billing_profile(owner_id).await?;
        let invoice = InvoiceService::generate_initial_invoice_in(&mut *tx, &lease, &profile).await?;
        tx.commit().await?;

        tracing::info!(lease_id = %lease.id, owner_id = %owner_id, "lease created");
        Ok((lease, invoice))
    }

    /// Records a signature. Signing again keeps the first timestamp.
    pub async fn sign(&self, owner_id: Uuid, lease_id: Uuid, party: SigningParty) -> Result<Lease, AppError> {
        let mut tx = self.store.begin().await?;
        let mut lease = tx
            .lease_for_update(lease_id)
            .await?
            .filter(|l| l.owner_id == owner_id)
            .ok_or_else(|| AppError::not_found("lease", lease_id))?;

        let now = Utc::now();
        let mut changed = false;
        match party {
            SigningParty::Owner => {
                if lease.owner_signed_at.is_none() {
                    lease.owner_signed_at = Some(now);
                    changed = true;
                }
            }
            SigningParty::Tenant => {
                if lease.tenant_signed_at.is_none() {
                    lease.tenant_signed_at = Some(now);
                    changed = true;
                }
                changed |= lease.advance(LeaseStatus::Signed);
            }
        }

        if !changed {
            tracing::debug!(lease_id = %lease_id, ?party, "lease already signed");
            return Ok(lease);
        }

        tx.update_lease(&lease).await?;
        tx.commit().await?;
        tracing::info!(lease_id = %lease_id, ?party, status = ?lease.status, "lease signed");
        Ok(lease)
    }

    pub async fn get(&self, owner_id: Uuid, lease_id: Uuid) -> Result<Lease, AppError> {
        let mut tx = self.store.begin().await?;
        tx.lease(lease_id)
            .await?
            .filter(|l| l.owner_id == owner_id)
            .ok_or_else(|| AppError::not_found("lease", lease_id))
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Lease>, AppError> {
        let mut tx = self.store.begin().await?;
        tx.leases(Some(owner_id)).await
    }
}
