use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use crate::domain::{
    errors::DatabaseError,
    fields::{Email, UserId},
    model::{
        ReferralBonusDocument, StatusCheckDocument, TransactionDocument, UserDocument,
    },
};

#[derive(Default)]
struct Collections {
    users: Vec<UserDocument>,
    referral_bonuses: HashMap<(UserId, UserId), ReferralBonusDocument>,
    transaction_history: Vec<TransactionDocument>,
    status_checks: Vec<StatusCheckDocument>,
}

/// In-process store with the same uniqueness rules as the MongoDB indexes.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn bonus_count(&self) -> usize {
        self.inner.read().await.referral_bonuses.len()
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.read().await.transaction_history.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert_user(&self, user: &UserDocument) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .iter()
            .any(|u| u.id == user.id || u.email == user.email)
        {
            return Err(DatabaseError::Duplicate);
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<UserDocument>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserDocument>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn find_referred_user(
        &self,
        referred: &UserId,
        referrer: &UserId,
    ) -> Result<Option<UserDocument>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| &u.id == referred && u.referred_by.as_ref() == Some(referrer))
            .cloned())
    }

    async fn increment_balance(
        &self,
        id: &UserId,
        amount: f64,
    ) -> Result<Option<f64>, DatabaseError> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.iter_mut().find(|u| &u.id == id).map(|u| {
            u.balance += amount;
            u.balance
        }))
    }

    async fn find_bonus(
        &self,
        referrer: &UserId,
        referred: &UserId,
    ) -> Result<Option<ReferralBonusDocument>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner
            .referral_bonuses
            .get(&(referrer.clone(), referred.clone()))
            .cloned())
    }

    async fn insert_bonus(&self, bonus: &ReferralBonusDocument) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        let key = (bonus.user_id.clone(), bonus.referred_user_id.clone());
        if inner.referral_bonuses.contains_key(&key) {
            return Err(DatabaseError::Duplicate);
        }
        inner.referral_bonuses.insert(key, bonus.clone());
        Ok(())
    }

    async fn delete_bonus(&self, id: &str) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        inner.referral_bonuses.retain(|_, b| b.id != id);
        Ok(())
    }

    async fn insert_transaction(&self, entry: &TransactionDocument) -> Result<(), DatabaseError> {
        self.inner
            .write()
            .await
            .transaction_history
            .push(entry.clone());
        Ok(())
    }

    async fn transactions_for(
        &self,
        owner: &UserId,
    ) -> Result<Vec<TransactionDocument>, DatabaseError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<_> = inner
            .transaction_history
            .iter()
            .filter(|t| &t.user_id == owner)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    async fn insert_status_check(
        &self,
        check: &StatusCheckDocument,
    ) -> Result<(), DatabaseError> {
        self.inner.write().await.status_checks.push(check.clone());
        Ok(())
    }

    async fn list_status_checks(
        &self,
        limit: i64,
    ) -> Result<Vec<StatusCheckDocument>, DatabaseError> {
        let inner = self.inner.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(inner.status_checks.iter().take(limit).cloned().collect())
    }
}
