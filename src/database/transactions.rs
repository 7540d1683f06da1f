// ABOUTME: Transaction guard for atomic multi-statement SQLite writes
// ABOUTME: Rolls back automatically on drop unless commit is reached
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recetario

use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::errors::{AppError, AppResult};

/// Guard around a SQLite transaction
///
/// Managers run every statement of a multi-row write through
/// [`executor`](Self::executor) and finish with [`commit`](Self::commit).
/// If any statement errors and the guard is dropped, the underlying
/// transaction rolls back, so concurrent readers never observe partial
/// aggregate state.
pub struct SqliteTransactionGuard<'a> {
    tx: Option<Transaction<'a, Sqlite>>,
}

impl<'a> SqliteTransactionGuard<'a> {
    /// Wrap a freshly begun transaction
    #[must_use]
    pub const fn new(tx: Transaction<'a, Sqlite>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Executor for the next statement inside the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction was already committed.
    pub fn executor(&mut self) -> AppResult<&mut SqliteConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::internal("Transaction already completed"))
    }

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails or was already performed.
    pub async fn commit(mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::internal("Transaction already completed"))?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {e}")))
    }
}
