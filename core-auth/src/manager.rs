//! # Lease Manager
//!
//! Owns the credential lease of one metadata client instance.
//!
//! ## Overview
//!
//! All reads and writes go through a single async mutex that is held across
//! the token exchange. Two tasks that both find the lease expired therefore
//! produce one exchange: the second waits, then sees the fresh lease.
//!
//! A failed exchange leaves the previous lease in place.

use crate::client_credentials::ClientCredentialsFlow;
use crate::error::Result;
use crate::lease::CredentialLease;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

pub struct LeaseManager {
    flow: ClientCredentialsFlow,
    lease: Mutex<Option<CredentialLease>>,
    acquisitions: AtomicU64,
}

impl LeaseManager {
    pub fn new(flow: ClientCredentialsFlow) -> Self {
        Self {
            flow,
            lease: Mutex::new(None),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Return a valid lease, acquiring one only if the current lease is
    /// missing or expired.
    ///
    /// # Errors
    ///
    /// Propagates the token exchange error; the stored lease is unchanged.
    #[instrument(skip(self))]
    pub async fn ensure_valid(&self) -> Result<CredentialLease> {
        let mut guard = self.lease.lock().await;
        let now = self.flow.clock().now();

        if let Some(lease) = guard.as_ref().filter(|lease| lease.is_valid_at(now)) {
            debug!(expires_at = %lease.expires_at, "Lease still valid; login skipped");
            return Ok(lease.clone());
        }

        self.acquire_into(&mut guard).await
    }

    /// Replace a lease the server rejected.
    ///
    /// `rejected_token` is the access token that received the 401. If the
    /// stored lease already carries a different, still valid token, another
    /// task refreshed it in the meantime and that lease is returned without a
    /// new exchange.
    #[instrument(skip(self, rejected_token))]
    pub async fn refresh_rejected(&self, rejected_token: &str) -> Result<CredentialLease> {
        let mut guard = self.lease.lock().await;
        let now = self.flow.clock().now();

        if let Some(lease) = guard
            .as_ref()
            .filter(|lease| lease.access_token != rejected_token && lease.is_valid_at(now))
        {
            debug!("Lease already refreshed by another task");
            return Ok(lease.clone());
        }

        self.acquire_into(&mut guard).await
    }

    /// Snapshot of the stored lease, valid or not.
    pub async fn current(&self) -> Option<CredentialLease> {
        self.lease.lock().await.clone()
    }

    /// Number of successful token exchanges performed so far.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    async fn acquire_into(&self, slot: &mut Option<CredentialLease>) -> Result<CredentialLease> {
        let lease = self.flow.acquire().await?;
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        info!(expires_at = %lease.expires_at, "Acquired new credential lease");
        *slot = Some(lease.clone());
        Ok(lease)
    }
}
