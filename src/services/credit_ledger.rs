use crate::{
    error::{ApiError, Result},
    models::{common::CreditKind, credits::CreditBalanceData},
};
use sea_orm::{entity::*, query::*, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Atomic reserve/release of per-user consumable quota.
///
/// Balances are only ever mutated here, inside a transaction holding a row
/// lock, so two concurrent reservations against a balance of 1 cannot both
/// succeed.
pub struct CreditLedger {
    db: DatabaseConnection,
}

/// Proof that one credit was atomically taken from a balance. Handed to the
/// submitter so a failed remote submission can return the hold.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub user_id: Uuid,
    pub kind: CreditKind,
}

impl CreditLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Atomically check-and-decrement one credit of the given kind.
    ///
    /// Fails with `InsufficientCredits` when the balance is zero or the user
    /// has no balance row at all. No remote calls have happened at this point,
    /// so failing here has no side effects to unwind.
    #[instrument(skip(self))]
    pub async fn reserve(&self, user_id: Uuid, kind: CreditKind) -> Result<Reservation> {
        let txn = self.db.begin().await?;

        let balance = self.find_and_lock_balance(user_id, &txn).await?;

        let available = match kind {
            CreditKind::Training => balance.training_credits,
            CreditKind::Generation => balance.generation_credits,
        };

        if available <= 0 {
            txn.rollback().await?;
            return Err(ApiError::InsufficientCredits(format!(
                "No {} credits remaining",
                kind.as_str()
            )));
        }

        let mut balance_active: entity::credit_balances::ActiveModel = balance.into();
        match kind {
            CreditKind::Training => {
                balance_active.training_credits = Set(available - 1);
            }
            CreditKind::Generation => {
                balance_active.generation_credits = Set(available - 1);
            }
        }
        balance_active.last_updated = Set(time::OffsetDateTime::now_utc());
        balance_active.update(&txn).await?;

        txn.commit().await?;

        info!(
            "Reserved 1 {} credit for user {} ({} remaining)",
            kind.as_str(),
            user_id,
            available - 1
        );

        Ok(Reservation { user_id, kind })
    }

    /// Return one previously reserved credit.
    ///
    /// Increments are clamped at the configured maximum for the kind; a clamp
    /// is logged, never an error, so a refund can never fail reconciliation.
    #[instrument(skip(self))]
    pub async fn release(&self, user_id: Uuid, kind: CreditKind) -> Result<()> {
        let txn = self.db.begin().await?;
        self.release_in_txn(user_id, kind, &txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Release within an existing transaction. Used by the reconciler so the
    /// refund commits atomically with the job's terminal transition.
    pub async fn release_in_txn(
        &self,
        user_id: Uuid,
        kind: CreditKind,
        txn: &DatabaseTransaction,
    ) -> Result<()> {
        let balance = self.find_and_lock_balance(user_id, txn).await?;

        let (current, max) = match kind {
            CreditKind::Training => (balance.training_credits, balance.max_training_credits),
            CreditKind::Generation => (balance.generation_credits, balance.max_generation_credits),
        };

        let restored = if current + 1 > max {
            warn!(
                "Release of {} credit for user {} clamped at max {} (balance was {})",
                kind.as_str(),
                user_id,
                max,
                current
            );
            max
        } else {
            current + 1
        };

        let mut balance_active: entity::credit_balances::ActiveModel = balance.into();
        match kind {
            CreditKind::Training => {
                balance_active.training_credits = Set(restored);
            }
            CreditKind::Generation => {
                balance_active.generation_credits = Set(restored);
            }
        }
        balance_active.last_updated = Set(time::OffsetDateTime::now_utc());
        balance_active.update(txn).await?;

        info!(
            "Released 1 {} credit for user {} (balance now {})",
            kind.as_str(),
            user_id,
            restored
        );

        Ok(())
    }

    /// Read-only snapshot for the credits route.
    #[instrument(skip(self))]
    pub async fn balance(&self, user_id: Uuid) -> Result<CreditBalanceData> {
        let balance = entity::credit_balances::Entity::find()
            .filter(entity::credit_balances::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No credit balance for user {}", user_id)))?;

        Ok(CreditBalanceData {
            training_credits: balance.training_credits,
            max_training_credits: balance.max_training_credits,
            generation_credits: balance.generation_credits,
            max_generation_credits: balance.max_generation_credits,
        })
    }

    async fn find_and_lock_balance(
        &self,
        user_id: Uuid,
        txn: &DatabaseTransaction,
    ) -> Result<entity::credit_balances::Model> {
        entity::credit_balances::Entity::find()
            .filter(entity::credit_balances::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| {
                ApiError::InsufficientCredits(format!("No credit balance for user {}", user_id))
            })
    }
}
