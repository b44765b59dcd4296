//! Points Ledger
//!
//! Single authority for mutating a customer's point balance. Every mutation
//! pairs one atomic balance update with exactly one appended ledger row, both
//! on the caller's transaction. The ledger is the source of truth; the cached
//! balance on `points_account` must always equal the sum of its deltas.
//!
//! Point math is pure and lives in free functions so quote and commit share it.

use super::error::{PointsError, PointsResult};
use super::member_level::MemberLevelEngine;
use crate::db::repository::point_transaction::{self, NewPointTransaction};
use crate::db::repository::{Tx, points_account};
use rust_decimal::prelude::*;
use shared::models::{
    MembershipTier, PointTransaction, PointTransactionPage, PointsAccount, PointsSummary, TierRates,
    TransactionKind,
};
use sqlx::SqlitePool;

/// Smallest redeemable amount
pub const MIN_REDEMPTION_POINTS: i64 = 100;
/// Exchange rate: 100 points = 1 currency unit
pub const POINTS_PER_CURRENCY_UNIT: i64 = 100;
/// Credited once when an account is opened
pub const SIGNUP_BONUS_POINTS: i64 = 50;

const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Point math
// =============================================================================

/// Largest currency amount the tier lets points cover, truncated to cents
pub fn discount_cap(subtotal: Decimal, rates: &TierRates) -> Decimal {
    if subtotal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (subtotal * rates.max_discount_percentage / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Currency value of `points`, capped at the tier's discount share of `subtotal`
pub fn redeemable_value(points: i64, rates: &TierRates, subtotal: Decimal) -> PointsResult<Decimal> {
    if points < MIN_REDEMPTION_POINTS {
        return Err(PointsError::BelowMinimumRedemption {
            requested: points,
            minimum: MIN_REDEMPTION_POINTS,
        });
    }
    let raw = Decimal::from(points) / Decimal::from(POINTS_PER_CURRENCY_UNIT);
    Ok(raw.min(discount_cap(subtotal, rates)))
}

/// Points matching the tier's cap, limited by what the customer holds
pub fn max_usable_points(subtotal: Decimal, rates: &TierRates, balance: i64) -> i64 {
    let cap_points = (discount_cap(subtotal, rates) * Decimal::from(POINTS_PER_CURRENCY_UNIT))
        .trunc()
        .to_i64()
        .unwrap_or(0);
    cap_points.min(balance.max(0))
}

/// One point per whole currency unit paid, times the tier multiplier, truncated
pub fn earned_points(payment: Decimal, rates: &TierRates) -> i64 {
    if payment <= Decimal::ZERO {
        return 0;
    }
    (payment.trunc() * rates.earning_multiplier)
        .trunc()
        .to_i64()
        .unwrap_or(0)
}

// =============================================================================
// Ledger
// =============================================================================

/// Result of a credit
#[derive(Debug, Clone, PartialEq)]
pub struct EarnOutcome {
    pub entry: PointTransaction,
    /// Tier after the credit
    pub tier: MembershipTier,
    /// Set when the credit moved the account to a different tier
    pub previous_tier: Option<MembershipTier>,
}

#[derive(Debug, Clone)]
pub struct PointsLedger {
    pool: SqlitePool,
    engine: MemberLevelEngine,
}

impl PointsLedger {
    pub fn new(pool: SqlitePool, engine: MemberLevelEngine) -> Self {
        Self { pool, engine }
    }

    /// Build with the tier configuration currently stored
    pub async fn load(pool: SqlitePool) -> PointsResult<Self> {
        let engine = MemberLevelEngine::load(&pool).await?;
        Ok(Self::new(pool, engine))
    }

    pub fn engine(&self) -> &MemberLevelEngine {
        &self.engine
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn redeemable(
        &self,
        points: i64,
        tier: MembershipTier,
        subtotal: Decimal,
    ) -> PointsResult<Decimal> {
        let rates = self.engine.rate_for(tier)?;
        redeemable_value(points, &rates, subtotal)
    }

    pub fn max_usable(&self, subtotal: Decimal, tier: MembershipTier, balance: i64) -> PointsResult<i64> {
        let rates = self.engine.rate_for(tier)?;
        Ok(max_usable_points(subtotal, &rates, balance))
    }

    /// Accrual on the final (post-redemption) payment
    pub fn earned_for(&self, payment: Decimal, tier: MembershipTier) -> PointsResult<i64> {
        let rates = self.engine.rate_for(tier)?;
        Ok(earned_points(payment, &rates))
    }

    /// Debit `points` and append a `used` entry
    ///
    /// The debit is compare-and-set against the live balance, so a balance
    /// read earlier in the attempt can never be overdrawn.
    pub async fn use_points(
        &self,
        tx: &mut Tx<'_>,
        customer_id: i64,
        points: i64,
        order_id: Option<i64>,
        description: &str,
    ) -> PointsResult<PointTransaction> {
        if points <= 0 {
            return Err(PointsError::InvalidAmount(points));
        }

        let Some(balance_after) = points_account::debit(tx, customer_id, points).await? else {
            let account = points_account::find(&mut **tx, customer_id)
                .await?
                .ok_or(PointsError::AccountNotFound(customer_id))?;
            return Err(PointsError::InsufficientBalance {
                requested: points,
                available: account.balance,
            });
        };

        let entry = point_transaction::append(
            tx,
            NewPointTransaction {
                customer_id,
                order_id,
                kind: TransactionKind::Used,
                points_change: -points,
                balance_after,
                description,
            },
        )
        .await?;

        tracing::debug!(customer_id, points, balance_after, "Points used");
        Ok(entry)
    }

    /// Credit balance and lifetime points, re-evaluate the tier, append the entry
    pub async fn earn(
        &self,
        tx: &mut Tx<'_>,
        customer_id: i64,
        points: i64,
        order_id: Option<i64>,
        kind: TransactionKind,
        description: &str,
    ) -> PointsResult<EarnOutcome> {
        if points <= 0 {
            return Err(PointsError::InvalidAmount(points));
        }
        if !kind.is_credit() {
            return Err(PointsError::InvalidKind(kind));
        }

        let credited = points_account::credit(tx, customer_id, points)
            .await
            .map_err(|e| match e {
                crate::db::repository::RepoError::NotFound(_) => PointsError::AccountNotFound(customer_id),
                other => other.into(),
            })?;

        let tier = self.engine.tier_for(credited.lifetime_points);
        let previous_tier = if tier != credited.tier {
            points_account::set_tier(tx, customer_id, tier, shared::util::now_millis()).await?;
            tracing::info!(
                customer_id,
                from = %credited.tier,
                to = %tier,
                lifetime_points = credited.lifetime_points,
                "Membership tier changed"
            );
            Some(credited.tier)
        } else {
            None
        };

        let entry = point_transaction::append(
            tx,
            NewPointTransaction {
                customer_id,
                order_id,
                kind,
                points_change: points,
                balance_after: credited.balance,
                description,
            },
        )
        .await?;

        tracing::debug!(customer_id, points, kind = kind.as_str(), balance_after = credited.balance, "Points credited");
        Ok(EarnOutcome {
            entry,
            tier,
            previous_tier,
        })
    }

    /// Create a zero-balance account at the entry tier if none exists
    pub async fn ensure_account(&self, tx: &mut Tx<'_>, customer_id: i64) -> PointsResult<bool> {
        let created = points_account::ensure(tx, customer_id, self.engine.tier_for(0)).await?;
        if created {
            tracing::info!(customer_id, "Points account created");
        }
        Ok(created)
    }

    /// Open the account and credit the signup bonus exactly once
    pub async fn open_account(&self, customer_id: i64) -> PointsResult<PointsAccount> {
        let mut tx = self.pool.begin().await.map_err(crate::db::repository::RepoError::from)?;

        // ensure is a write, so the bonus check below runs under the write lock
        self.ensure_account(&mut tx, customer_id).await?;
        if !point_transaction::exists_kind(&mut *tx, customer_id, TransactionKind::SignupBonus).await? {
            self.earn(
                &mut tx,
                customer_id,
                SIGNUP_BONUS_POINTS,
                None,
                TransactionKind::SignupBonus,
                "Signup bonus",
            )
            .await?;
        }
        let account = points_account::find(&mut *tx, customer_id)
            .await?
            .ok_or(PointsError::AccountNotFound(customer_id))?;

        tx.commit().await.map_err(crate::db::repository::RepoError::from)?;
        Ok(account)
    }

    /// Standalone credit outside any order (birthday, referral, refund)
    pub async fn grant_bonus(
        &self,
        customer_id: i64,
        kind: TransactionKind,
        points: i64,
        description: &str,
    ) -> PointsResult<EarnOutcome> {
        let mut tx = self.pool.begin().await.map_err(crate::db::repository::RepoError::from)?;
        let outcome = self.earn(&mut tx, customer_id, points, None, kind, description).await?;
        tx.commit().await.map_err(crate::db::repository::RepoError::from)?;
        Ok(outcome)
    }

    pub async fn account(&self, customer_id: i64) -> PointsResult<PointsAccount> {
        points_account::find(&self.pool, customer_id)
            .await?
            .ok_or(PointsError::AccountNotFound(customer_id))
    }

    /// Balance, tier, rates and progress towards the next tier
    pub async fn summary(&self, customer_id: i64) -> PointsResult<PointsSummary> {
        let account = self.account(customer_id).await?;
        let rates = self.engine.rate_for(account.tier)?;
        Ok(PointsSummary {
            balance: account.balance,
            lifetime_points: account.lifetime_points,
            tier: account.tier,
            rates,
            next_tier: self.engine.next_tier(account.tier, account.lifetime_points),
        })
    }

    /// Ledger entries, newest first
    pub async fn history(
        &self,
        customer_id: i64,
        kind: Option<TransactionKind>,
        page: u32,
        per_page: u32,
    ) -> PointsResult<PointTransactionPage> {
        self.account(customer_id).await?;

        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(per_page);
        let (transactions, total) =
            point_transaction::find_page(&self.pool, customer_id, kind, i64::from(per_page), offset).await?;

        let per_page_i64 = i64::from(per_page);
        Ok(PointTransactionPage {
            transactions,
            total,
            page,
            per_page,
            pages: (total + per_page_i64 - 1) / per_page_i64,
        })
    }

    /// Replay the ledger and check it reproduces the stored balance
    pub async fn verify(&self, customer_id: i64) -> PointsResult<i64> {
        let account = self.account(customer_id).await?;
        let entries = point_transaction::find_by_customer(&self.pool, customer_id).await?;

        let mut running = 0i64;
        for entry in &entries {
            running += entry.points_change;
            if entry.balance_after != running {
                return Err(PointsError::LedgerMismatch {
                    customer_id,
                    stored: entry.balance_after,
                    replayed: running,
                });
            }
        }
        if running != account.balance {
            return Err(PointsError::LedgerMismatch {
                customer_id,
                stored: account.balance,
                replayed: running,
            });
        }
        Ok(running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::loyalty::member_level::tests::default_engine;

    fn bronze() -> TierRates {
        TierRates {
            earning_multiplier: Decimal::ONE,
            max_discount_percentage: Decimal::from(10),
        }
    }

    fn gold() -> TierRates {
        TierRates {
            earning_multiplier: Decimal::new(150, 2),
            max_discount_percentage: Decimal::from(20),
        }
    }

    async fn ledger() -> PointsLedger {
        let db = DbService::in_memory().await.unwrap();
        PointsLedger::new(db.pool, default_engine())
    }

    /// Account holding `balance` points, all credited in one entry
    async fn funded(ledger: &PointsLedger, customer_id: i64, balance: i64) {
        let mut tx = ledger.pool().begin().await.unwrap();
        ledger.ensure_account(&mut tx, customer_id).await.unwrap();
        ledger
            .earn(&mut tx, customer_id, balance, None, TransactionKind::ReferralBonus, "seed")
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    // ---- pure math ----

    #[test]
    fn test_redeemable_below_minimum() {
        let err = redeemable_value(99, &bronze(), Decimal::from(100)).unwrap_err();
        assert!(matches!(
            err,
            PointsError::BelowMinimumRedemption { requested: 99, minimum: 100 }
        ));
    }

    #[test]
    fn test_redeemable_capped_by_tier() {
        // 1000 points = 10.00, but bronze caps a 20.00 order at 2.00
        assert_eq!(
            redeemable_value(1000, &bronze(), Decimal::from(20)).unwrap(),
            Decimal::new(200, 2)
        );
        // gold's cap is higher
        assert_eq!(
            redeemable_value(1000, &gold(), Decimal::from(20)).unwrap(),
            Decimal::new(400, 2)
        );
        // raw conversion below the cap wins
        assert_eq!(
            redeemable_value(150, &gold(), Decimal::from(20)).unwrap(),
            Decimal::new(150, 2)
        );
    }

    #[test]
    fn test_cap_never_rounds_up() {
        // 9.99 * 15% = 1.4985 -> 1.49
        let rates = TierRates {
            earning_multiplier: Decimal::ONE,
            max_discount_percentage: Decimal::from(15),
        };
        assert_eq!(discount_cap(Decimal::new(999, 2), &rates), Decimal::new(149, 2));
        assert_eq!(max_usable_points(Decimal::new(999, 2), &rates, 10_000), 149);
    }

    #[test]
    fn test_max_usable_limited_by_balance() {
        assert_eq!(max_usable_points(Decimal::from(20), &bronze(), 500), 200);
        assert_eq!(max_usable_points(Decimal::from(20), &bronze(), 150), 150);
        assert_eq!(max_usable_points(Decimal::ZERO, &bronze(), 150), 0);
    }

    #[test]
    fn test_earned_points_truncation() {
        assert_eq!(earned_points(Decimal::new(1899, 2), &bronze()), 18);
        // trunc(18.99) = 18, * 1.5 = 27
        assert_eq!(earned_points(Decimal::new(1899, 2), &gold()), 27);
        // 7 * 1.5 = 10.5 -> 10
        assert_eq!(earned_points(Decimal::from(7), &gold()), 10);
        assert_eq!(earned_points(Decimal::new(99, 2), &gold()), 0);
    }

    #[tokio::test]
    async fn test_rates_require_config() {
        let db = DbService::in_memory().await.unwrap();
        let ledger = PointsLedger::new(db.pool, MemberLevelEngine::new(vec![]));
        assert!(matches!(
            ledger.earned_for(Decimal::from(10), MembershipTier::Bronze),
            Err(PointsError::ConfigMissing(MembershipTier::Bronze))
        ));
    }

    // ---- ledger mutations ----

    #[tokio::test]
    async fn test_use_points_debits_and_records() {
        let ledger = ledger().await;
        funded(&ledger, 1, 500).await;

        let mut tx = ledger.pool().begin().await.unwrap();
        let entry = ledger.use_points(&mut tx, 1, 200, None, "redeem").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(entry.points_change, -200);
        assert_eq!(entry.balance_after, 300);
        let account = ledger.account(1).await.unwrap();
        assert_eq!(account.balance, 300);
        // redemption never lowers lifetime points
        assert_eq!(account.lifetime_points, 500);
        assert_eq!(ledger.verify(1).await.unwrap(), 300);
    }

    #[tokio::test]
    async fn test_use_points_insufficient() {
        let ledger = ledger().await;
        funded(&ledger, 1, 150).await;

        let mut tx = ledger.pool().begin().await.unwrap();
        let err = ledger.use_points(&mut tx, 1, 200, None, "redeem").await.unwrap_err();
        assert!(matches!(
            err,
            PointsError::InsufficientBalance { requested: 200, available: 150 }
        ));
        let err = ledger.use_points(&mut tx, 2, 100, None, "redeem").await.unwrap_err();
        assert!(matches!(err, PointsError::AccountNotFound(2)));
    }

    #[tokio::test]
    async fn test_earn_crossing_threshold_changes_tier() {
        let ledger = ledger().await;
        funded(&ledger, 1, 4990).await;
        assert_eq!(ledger.account(1).await.unwrap().tier, MembershipTier::Silver);

        let mut tx = ledger.pool().begin().await.unwrap();
        let outcome = ledger
            .earn(&mut tx, 1, 20, None, TransactionKind::Earned, "order")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome.tier, MembershipTier::Gold);
        assert_eq!(outcome.previous_tier, Some(MembershipTier::Silver));
        assert_eq!(outcome.entry.balance_after, 5010);

        let account = ledger.account(1).await.unwrap();
        assert_eq!(account.tier, MembershipTier::Gold);
        assert_eq!(account.lifetime_points, 5010);
        assert!(account.tier_upgraded_at.is_some());
    }

    #[tokio::test]
    async fn test_earn_rejects_debit_kinds() {
        let ledger = ledger().await;
        funded(&ledger, 1, 10).await;
        let mut tx = ledger.pool().begin().await.unwrap();
        assert!(matches!(
            ledger.earn(&mut tx, 1, 5, None, TransactionKind::Used, "x").await,
            Err(PointsError::InvalidKind(TransactionKind::Used))
        ));
        assert!(matches!(
            ledger.earn(&mut tx, 1, 0, None, TransactionKind::Earned, "x").await,
            Err(PointsError::InvalidAmount(0))
        ));
    }

    #[tokio::test]
    async fn test_open_account_grants_bonus_once() {
        let ledger = ledger().await;
        let account = ledger.open_account(9).await.unwrap();
        assert_eq!(account.balance, SIGNUP_BONUS_POINTS);

        let again = ledger.open_account(9).await.unwrap();
        assert_eq!(again.balance, SIGNUP_BONUS_POINTS);

        let history = ledger.history(9, Some(TransactionKind::SignupBonus), 1, 20).await.unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.pages, 1);
    }

    #[tokio::test]
    async fn test_grant_bonus_credits_and_promotes() {
        let ledger = ledger().await;
        funded(&ledger, 1, 950).await;

        let outcome = ledger
            .grant_bonus(1, TransactionKind::BirthdayBonus, 100, "Birthday bonus")
            .await
            .unwrap();
        assert_eq!(outcome.entry.kind, TransactionKind::BirthdayBonus);
        assert_eq!(outcome.entry.order_id, None);
        assert_eq!(outcome.tier, MembershipTier::Silver);
        assert_eq!(outcome.previous_tier, Some(MembershipTier::Bronze));

        let outcome = ledger
            .grant_bonus(1, TransactionKind::Refunded, 30, "Refund for cancelled order")
            .await
            .unwrap();
        assert_eq!(outcome.entry.balance_after, 1080);
        assert_eq!(outcome.previous_tier, None);

        let account = ledger.account(1).await.unwrap();
        assert_eq!(account.balance, 1080);
        assert_eq!(account.lifetime_points, 1080);
        assert_eq!(account.tier, MembershipTier::Silver);
        assert_eq!(ledger.verify(1).await.unwrap(), 1080);
    }

    #[tokio::test]
    async fn test_grant_bonus_rejections() {
        let ledger = ledger().await;
        funded(&ledger, 1, 100).await;

        for kind in [TransactionKind::Used, TransactionKind::Expired] {
            assert!(matches!(
                ledger.grant_bonus(1, kind, 10, "x").await,
                Err(PointsError::InvalidKind(k)) if k == kind
            ));
        }
        assert!(matches!(
            ledger.grant_bonus(2, TransactionKind::ReferralBonus, 10, "x").await,
            Err(PointsError::AccountNotFound(2))
        ));

        // nothing written by the rejected grants
        assert_eq!(ledger.verify(1).await.unwrap(), 100);
        assert_eq!(ledger.history(1, None, 1, 10).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_summary_reports_next_tier() {
        let ledger = ledger().await;
        funded(&ledger, 1, 900).await;
        let summary = ledger.summary(1).await.unwrap();
        assert_eq!(summary.tier, MembershipTier::Bronze);
        assert_eq!(summary.rates, bronze());
        let next = summary.next_tier.unwrap();
        assert_eq!(next.tier, MembershipTier::Silver);
        assert_eq!(next.points_needed, 100);
    }

    #[tokio::test]
    async fn test_history_pagination() {
        let ledger = ledger().await;
        funded(&ledger, 1, 1000).await;
        let mut tx = ledger.pool().begin().await.unwrap();
        for _ in 0..4 {
            ledger.use_points(&mut tx, 1, 100, None, "redeem").await.unwrap();
        }
        tx.commit().await.unwrap();

        let page = ledger.history(1, None, 2, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        assert_eq!(page.transactions.len(), 2);
        // newest first: page 2 holds the 3rd and 4th newest
        assert_eq!(page.transactions[0].balance_after, 800);

        assert!(matches!(
            ledger.history(42, None, 1, 10).await,
            Err(PointsError::AccountNotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_verify_detects_tampered_balance() {
        let ledger = ledger().await;
        funded(&ledger, 1, 300).await;
        assert_eq!(ledger.verify(1).await.unwrap(), 300);

        sqlx::query("UPDATE points_account SET balance = 999 WHERE customer_id = 1")
            .execute(ledger.pool())
            .await
            .unwrap();
        assert!(matches!(
            ledger.verify(1).await,
            Err(PointsError::LedgerMismatch { stored: 999, replayed: 300, .. })
        ));
    }
}
