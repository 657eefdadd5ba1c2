use super::fields::{User, UserId};
use serde::Serialize;

#[derive(Serialize, Clone, Debug)]
pub struct ReferralBonusEvent {
    pub referrer: UserId,
    pub referred_user: UserId,
    pub bonus_amount: f64,
    pub balance_after: f64,
}

#[derive(Serialize, Clone, Debug)]
#[serde(tag = "type", content = "data")]
pub enum AppEvent {
    NewRegister(User),
    ReferralBonusGranted(ReferralBonusEvent),
}
