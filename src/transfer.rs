use std::sync::Arc;

use pfstore_core::StorageError;

use crate::connection::{ConnectionManager, TxnScope};
use crate::ledger;

/// Composes two balance updates into one atomic transaction.
pub struct TransferCoordinator {
    conn: Arc<ConnectionManager>,
}

impl TransferCoordinator {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self { conn }
    }

    /// Set both balances inside a single transaction with one commit.
    /// If either update fails, neither balance changes. No retry: the
    /// caller recomputes the desired balances and calls again.
    pub fn transfer(
        &self,
        self_name: &str,
        self_amount: i64,
        partner_name: &str,
        partner_amount: i64,
    ) -> Result<(), StorageError> {
        self.conn.with_txn(|tx| {
            transfer(tx, self_name, self_amount, partner_name, partner_amount)
        })
    }
}

fn transfer(
    tx: &mut TxnScope<'_>,
    self_name: &str,
    self_amount: i64,
    partner_name: &str,
    partner_amount: i64,
) -> Result<(), StorageError> {
    ledger::update_amount(tx, self_name, self_amount)?;
    ledger::update_amount(tx, partner_name, partner_amount)?;
    tracing::debug!(self_name, partner_name, "transfer applied");
    Ok(())
}
