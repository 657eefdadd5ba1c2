//! A [`MemoryStore`] wrapper that fails selected operations on demand.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{MemoryStore, Store};
use crate::domain::{
    errors::DatabaseError,
    fields::{Email, UserId},
    model::{
        ReferralBonusDocument, StatusCheckDocument, TransactionDocument, UserDocument,
    },
};

#[derive(Default)]
pub struct Faults {
    /// `find_referred_user` errors.
    pub referral_lookup: AtomicBool,
    /// The next `increment_balance` is applied and then reported as an error.
    pub increment_lost_reply: AtomicBool,
    /// `increment_balance` behaves as if the user had been deleted.
    pub increment_missing_user: AtomicBool,
    /// `insert_transaction` errors.
    pub transaction_insert: AtomicBool,
}

#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    pub faults: Faults,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn trip(flag: &AtomicBool) {
    flag.store(true, Ordering::SeqCst);
}

fn tripped(flag: &AtomicBool) -> bool {
    flag.load(Ordering::SeqCst)
}

#[async_trait]
impl Store for FaultyStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.inner.health_check().await
    }

    async fn insert_user(&self, user: &UserDocument) -> Result<(), DatabaseError> {
        self.inner.insert_user(user).await
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<UserDocument>, DatabaseError> {
        self.inner.find_user(id).await
    }

    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserDocument>, DatabaseError> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_referred_user(
        &self,
        referred: &UserId,
        referrer: &UserId,
    ) -> Result<Option<UserDocument>, DatabaseError> {
        if tripped(&self.faults.referral_lookup) {
            return Err(DatabaseError::ServerError);
        }
        self.inner.find_referred_user(referred, referrer).await
    }

    async fn increment_balance(
        &self,
        id: &UserId,
        amount: f64,
    ) -> Result<Option<f64>, DatabaseError> {
        if tripped(&self.faults.increment_missing_user) {
            return Ok(None);
        }
        let balance = self.inner.increment_balance(id, amount).await?;
        if self.faults.increment_lost_reply.swap(false, Ordering::SeqCst) {
            return Err(DatabaseError::ServerError);
        }
        Ok(balance)
    }

    async fn find_bonus(
        &self,
        referrer: &UserId,
        referred: &UserId,
    ) -> Result<Option<ReferralBonusDocument>, DatabaseError> {
        self.inner.find_bonus(referrer, referred).await
    }

    async fn insert_bonus(&self, bonus: &ReferralBonusDocument) -> Result<(), DatabaseError> {
        self.inner.insert_bonus(bonus).await
    }

    async fn delete_bonus(&self, id: &str) -> Result<(), DatabaseError> {
        self.inner.delete_bonus(id).await
    }

    async fn insert_transaction(&self, entry: &TransactionDocument) -> Result<(), DatabaseError> {
        if tripped(&self.faults.transaction_insert) {
            return Err(DatabaseError::ServerError);
        }
        self.inner.insert_transaction(entry).await
    }

    async fn transactions_for(
        &self,
        owner: &UserId,
    ) -> Result<Vec<TransactionDocument>, DatabaseError> {
        self.inner.transactions_for(owner).await
    }

    async fn insert_status_check(
        &self,
        check: &StatusCheckDocument,
    ) -> Result<(), DatabaseError> {
        self.inner.insert_status_check(check).await
    }

    async fn list_status_checks(
        &self,
        limit: i64,
    ) -> Result<Vec<StatusCheckDocument>, DatabaseError> {
        self.inner.list_status_checks(limit).await
    }
}
