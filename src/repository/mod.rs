//! Storage seam for users, the referral ledger, the transaction history and
//! status checks.

use async_trait::async_trait;

use crate::domain::{
    errors::DatabaseError,
    fields::{Email, UserId},
    model::{
        ReferralBonusDocument, StatusCheckDocument, TransactionDocument, UserDocument,
    },
};

#[cfg(test)]
pub mod faulty;
pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    /// Fails with [`DatabaseError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: &UserDocument) -> Result<(), DatabaseError>;

    async fn find_user(&self, id: &UserId) -> Result<Option<UserDocument>, DatabaseError>;

    async fn find_user_by_email(&self, email: &Email)
        -> Result<Option<UserDocument>, DatabaseError>;

    /// Returns the user `referred` only if its `referred_by` is `referrer`.
    async fn find_referred_user(
        &self,
        referred: &UserId,
        referrer: &UserId,
    ) -> Result<Option<UserDocument>, DatabaseError>;

    /// Atomically adds `amount` to the user's balance and returns the new
    /// balance, or `None` if the user does not exist.
    async fn increment_balance(
        &self,
        id: &UserId,
        amount: f64,
    ) -> Result<Option<f64>, DatabaseError>;

    async fn find_bonus(
        &self,
        referrer: &UserId,
        referred: &UserId,
    ) -> Result<Option<ReferralBonusDocument>, DatabaseError>;

    /// Fails with [`DatabaseError::Duplicate`] when the pair already has a
    /// record.
    async fn insert_bonus(&self, bonus: &ReferralBonusDocument) -> Result<(), DatabaseError>;

    async fn delete_bonus(&self, id: &str) -> Result<(), DatabaseError>;

    async fn insert_transaction(&self, entry: &TransactionDocument) -> Result<(), DatabaseError>;

    /// Newest first.
    async fn transactions_for(
        &self,
        owner: &UserId,
    ) -> Result<Vec<TransactionDocument>, DatabaseError>;

    async fn insert_status_check(
        &self,
        check: &StatusCheckDocument,
    ) -> Result<(), DatabaseError>;

    async fn list_status_checks(
        &self,
        limit: i64,
    ) -> Result<Vec<StatusCheckDocument>, DatabaseError>;
}
