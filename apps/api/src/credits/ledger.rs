//! Server-side credit ledger. Accounts are created lazily with the
//! configured starting balance.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;

/// Carried in `AppState` as `Arc<dyn CreditLedger>`.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    async fn balance(&self, user_id: Uuid) -> Result<i32, AppError>;

    /// Takes one credit. Returns the remaining balance, or `None` when the
    /// account was already empty. Never drives the balance below zero.
    async fn try_consume(&self, user_id: Uuid) -> Result<Option<i32>, AppError>;
}

pub struct PgCreditLedger {
    pool: PgPool,
    default_credits: i32,
}

impl PgCreditLedger {
    pub fn new(pool: PgPool, default_credits: i32) -> Self {
        Self {
            pool,
            default_credits,
        }
    }

    async fn ensure_account(&self, user_id: Uuid) -> Result<(), AppError> {
        let created = sqlx::query(
            r#"
            INSERT INTO credit_accounts (user_id, credits)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(self.default_credits)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if created > 0 {
            info!(
                "Opened credit account for user {user_id} with {} credits",
                self.default_credits
            );
        }
        Ok(())
    }
}

#[async_trait]
impl CreditLedger for PgCreditLedger {
    async fn balance(&self, user_id: Uuid) -> Result<i32, AppError> {
        self.ensure_account(user_id).await?;

        Ok(
            sqlx::query_scalar("SELECT credits FROM credit_accounts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn try_consume(&self, user_id: Uuid) -> Result<Option<i32>, AppError> {
        self.ensure_account(user_id).await?;

        // Single conditional UPDATE: concurrent requests cannot overdraw.
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE credit_accounts
            SET credits = credits - 1, updated_at = NOW()
            WHERE user_id = $1 AND credits > 0
            RETURNING credits
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match remaining {
            Some(left) => debug!("User {user_id} consumed a credit, {left} left"),
            None => debug!("User {user_id} has no credits left"),
        }
        Ok(remaining)
    }
}
