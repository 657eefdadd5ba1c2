//! Referral bonus granting.
//!
//! A bonus is paid at most once per referral pair. The ledger record is
//! inserted before the balance moves, and the unique `(user_id,
//! referred_user_id)` key in the store decides which of several concurrent
//! grants wins. The balance is then raised with a single atomic increment.
//! If the referrer is gone by then the ledger record is removed again. A
//! failed increment keeps the record: the credit may have landed, and a
//! ledger record without a credit is the recoverable side of that state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

use crate::{
    domain::{
        errors::DatabaseError,
        events::{AppEvent, ReferralBonusEvent},
        fields::UserId,
        model::{ReferralBonusDocument, TransactionDocument},
    },
    repository::Store,
};

#[derive(Debug, Clone, PartialEq)]
pub enum BonusOutcome {
    Granted { bonus_amount: f64, balance_after: f64 },
    /// The referred user is absent or names a different referrer.
    NotEligible,
    AlreadyGranted,
    /// The referrer's own record is gone.
    ReferrerMissing,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReferralBonusResponse {
    pub success: bool,
    pub message: String,
    pub bonus_amount: f64,
}

impl ReferralBonusResponse {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            bonus_amount: 0.0,
        }
    }

    pub fn store_failure() -> Self {
        Self::failure("An error occurred while processing the referral bonus")
    }
}

impl From<BonusOutcome> for ReferralBonusResponse {
    fn from(outcome: BonusOutcome) -> Self {
        match outcome {
            BonusOutcome::Granted { bonus_amount, .. } => Self {
                success: true,
                message: format!("Successfully granted Rs. {} referral bonus", bonus_amount),
                bonus_amount,
            },
            BonusOutcome::NotEligible => Self::failure("Invalid referral or user not found"),
            BonusOutcome::AlreadyGranted => {
                Self::failure("Referral bonus already granted for this user")
            }
            BonusOutcome::ReferrerMissing => Self::failure("User not found"),
        }
    }
}

#[derive(Clone)]
pub struct ReferralBonusGranter {
    store: Arc<dyn Store>,
    bonus_amount: f64,
}

impl ReferralBonusGranter {
    pub fn new(store: Arc<dyn Store>, bonus_amount: f64) -> Self {
        Self {
            store,
            bonus_amount,
        }
    }

    pub fn bonus_amount(&self) -> f64 {
        self.bonus_amount
    }

    #[tracing::instrument(name = "grant_referral_bonus", skip(self))]
    pub async fn grant(
        &self,
        referrer: &UserId,
        referred: &UserId,
    ) -> Result<BonusOutcome, DatabaseError> {
        if self
            .store
            .find_referred_user(referred, referrer)
            .await?
            .is_none()
        {
            return Ok(BonusOutcome::NotEligible);
        }

        if self.store.find_bonus(referrer, referred).await?.is_some() {
            return Ok(BonusOutcome::AlreadyGranted);
        }

        if self.store.find_user(referrer).await?.is_none() {
            tracing::warn!("referrer vanished after referral check");
            return Ok(BonusOutcome::ReferrerMissing);
        }

        let record = ReferralBonusDocument::new(referrer, referred, self.bonus_amount);
        match self.store.insert_bonus(&record).await {
            Ok(()) => {}
            Err(DatabaseError::Duplicate) => return Ok(BonusOutcome::AlreadyGranted),
            Err(e) => return Err(e),
        }

        let balance_after = match self.store.increment_balance(referrer, self.bonus_amount).await
        {
            Ok(Some(balance)) => balance,
            Ok(None) => {
                self.release(&record).await;
                return Ok(BonusOutcome::ReferrerMissing);
            }
            Err(e) => {
                // The increment may have landed before the error surfaced.
                tracing::error!(
                    error = ?e,
                    bonus_id = %record.id,
                    "credit unconfirmed, ledger record kept"
                );
                return Err(e);
            }
        };

        let entry = TransactionDocument::referral_bonus(
            referrer,
            referred,
            self.bonus_amount,
            balance_after,
        );
        if let Err(e) = self.store.insert_transaction(&entry).await {
            tracing::error!(
                error = ?e,
                balance_after,
                "bonus paid but transaction history entry was not written"
            );
        }

        tracing::info!(balance_after, "referral bonus granted");
        Ok(BonusOutcome::Granted {
            bonus_amount: self.bonus_amount,
            balance_after,
        })
    }

    /// Undo the ledger claim when the referrer has no record to credit.
    async fn release(&self, record: &ReferralBonusDocument) {
        if let Err(e) = self.store.delete_bonus(&record.id).await {
            tracing::error!(
                error = ?e,
                bonus_id = %record.id,
                "ledger record left without a matching balance credit"
            );
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferralJob {
    pub referrer: UserId,
    pub referred_user: UserId,
}

/// Runs grants for freshly registered users off the request path.
#[derive(Clone)]
pub struct ReferralDispatcher {
    tx: mpsc::UnboundedSender<ReferralJob>,
}

impl ReferralDispatcher {
    pub fn spawn(
        granter: ReferralBonusGranter,
        events: broadcast::Sender<AppEvent>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ReferralJob>();

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                process(&granter, &events, job).await;
            }
            tracing::info!("referral dispatcher stopped");
        });

        (Self { tx }, handle)
    }

    pub fn dispatch(&self, job: ReferralJob) {
        if let Err(e) = self.tx.send(job) {
            tracing::error!(
                referrer = %e.0.referrer,
                referred_user = %e.0.referred_user,
                "referral dispatcher is not running, bonus not queued"
            );
        }
    }
}

async fn process(
    granter: &ReferralBonusGranter,
    events: &broadcast::Sender<AppEvent>,
    job: ReferralJob,
) {
    match granter.grant(&job.referrer, &job.referred_user).await {
        Ok(BonusOutcome::Granted {
            bonus_amount,
            balance_after,
        }) => {
            let _ = events.send(AppEvent::ReferralBonusGranted(ReferralBonusEvent {
                referrer: job.referrer,
                referred_user: job.referred_user,
                bonus_amount,
                balance_after,
            }));
        }
        Ok(outcome) => {
            tracing::info!(
                referrer = %job.referrer,
                referred_user = %job.referred_user,
                ?outcome,
                "automatic referral bonus skipped"
            );
        }
        Err(e) => {
            tracing::error!(
                referrer = %job.referrer,
                referred_user = %job.referred_user,
                error = ?e,
                "automatic referral bonus failed"
            );
        }
    }
}
