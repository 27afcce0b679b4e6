//! Subscription-plan usage gate.
//!
//! The core consumes a pass/fail decision; it never records usage or
//! mutates the account. Persistence, payment state, and the actual counter
//! increment belong to the account-store collaborator.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Subscription plan tiers and their monthly write limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    /// 10 writes per month.
    Free,
    /// 100 writes per month.
    Basic,
    /// Unlimited.
    Pro,
}

impl PlanTier {
    /// Monthly write limit; `None` means unlimited.
    pub fn monthly_limit(self) -> Option<u32> {
        match self {
            PlanTier::Free => Some(10),
            PlanTier::Basic => Some(100),
            PlanTier::Pro => None,
        }
    }

    /// Japanese plan label used in reply texts.
    pub fn label(self) -> &'static str {
        match self {
            PlanTier::Free => "無料プラン",
            PlanTier::Basic => "ベーシックプラン",
            PlanTier::Pro => "プロプラン",
        }
    }
}

/// A user's billing state as supplied by the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageAccount {
    /// Current subscription tier.
    pub tier: PlanTier,
    /// Writes recorded since `last_reset`.
    pub monthly_usage: u32,
    /// When the monthly counter was last reset.
    pub last_reset: NaiveDate,
}

/// Pass/fail result of the usage gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageDecision {
    /// Writing is allowed; `remaining` is `None` on unlimited plans.
    Allowed {
        /// Writes left this month, when the plan is limited.
        remaining: Option<u32>,
    },
    /// The monthly limit has been reached.
    LimitReached {
        /// The limit that was hit.
        limit: u32,
    },
}

impl UsageDecision {
    /// True when the gate permits a write.
    pub fn is_allowed(&self) -> bool {
        matches!(self, UsageDecision::Allowed { .. })
    }
}

/// Evaluate the usage gate for `today`.
///
/// Pure: when the reset date's month or year differs from today, the
/// counter is treated as already reset, but persisting that reset is the
/// caller's job.
pub fn check_usage(account: &UsageAccount, today: NaiveDate) -> UsageDecision {
    let usage = effective_usage(account, today);
    match account.tier.monthly_limit() {
        None => UsageDecision::Allowed { remaining: None },
        Some(limit) if usage >= limit => UsageDecision::LimitReached { limit },
        Some(limit) => UsageDecision::Allowed {
            remaining: Some(limit.saturating_sub(usage)),
        },
    }
}

/// Usage summary in the original bot's reply format.
pub fn usage_summary(account: &UsageAccount, today: NaiveDate) -> String {
    let usage = effective_usage(account, today);
    let remaining = match account.tier.monthly_limit() {
        Some(limit) => limit.saturating_sub(usage).to_string(),
        None => "無制限".to_owned(),
    };
    format!(
        "📊 利用状況\n\nプラン: {}\n今月の利用回数: {usage}回\n残り利用回数: {remaining}回\nリセット日: {}",
        account.tier.label(),
        account.last_reset
    )
}

fn effective_usage(account: &UsageAccount, today: NaiveDate) -> u32 {
    if account.last_reset.month() != today.month() || account.last_reset.year() != today.year() {
        0
    } else {
        account.monthly_usage
    }
}
