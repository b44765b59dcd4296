//! Order Settlement Coordinator
//!
//! One settlement attempt, split in two phases:
//!
//! ```text
//! prepare (reads only)                 commit (one transaction)
//! ─────────────────────                ────────────────────────────────────
//! validate + price cart                insert order   (savepoint, retry once
//! snapshot account tier/balance                        on order_number clash)
//! resolve redemption (best effort)     insert items
//! compute earned points                ensure account
//!                                      debit points   (compare-and-set)
//!                                      credit earned + tier recompute
//!                                      COMMIT
//! ```
//!
//! Any error after `begin` returns early with `?`; the dropped transaction
//! rolls back, so no partial order is ever visible. The balance read in
//! `prepare` may be stale by the time `commit` runs; the debit re-checks it
//! against the live row and fails the whole attempt with `InsufficientBalance`.

use super::error::{SettlementError, SettlementResult};
use super::identifier::{IdentifierGenerator, OrderNumberSource};
use super::pricing::{self, PricedCart};
use crate::db::repository::order::{self as order_repo, NewOrder};
use crate::db::repository::{RepoError, Tx, points_account};
use crate::loyalty::{PointsError, PointsLedger};
use crate::money::round_money;
use rust_decimal::Decimal;
use shared::models::{
    Cart, MembershipTier, Order, OrderSummary, PointsQuote, RedemptionRequest, SettlementReceipt,
    TransactionKind,
};
use std::sync::Arc;

/// Fully resolved settlement attempt, ready to commit
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPlan {
    pub customer_id: Option<i64>,
    pub cart: PricedCart,
    pub notes: Option<String>,
    /// Tier snapshot recorded on the order
    pub tier: MembershipTier,
    pub points_to_use: i64,
    pub points_deduction: Decimal,
    pub final_payment: Decimal,
    pub points_earned: i64,
}

/// Redemption after clamping and the minimum-floor fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Redemption {
    max_usable: i64,
    points: i64,
    value: Decimal,
}

impl Redemption {
    const NONE: Redemption = Redemption {
        max_usable: 0,
        points: 0,
        value: Decimal::ZERO,
    };
}

#[derive(Clone)]
pub struct SettlementCoordinator {
    ledger: PointsLedger,
    identifiers: Arc<dyn OrderNumberSource>,
}

impl SettlementCoordinator {
    pub fn new(ledger: PointsLedger) -> Self {
        Self::with_identifiers(ledger, Arc::new(IdentifierGenerator))
    }

    pub fn with_identifiers(ledger: PointsLedger, identifiers: Arc<dyn OrderNumberSource>) -> Self {
        Self { ledger, identifiers }
    }

    pub fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    /// Validate, price, resolve redemption and commit as one atomic unit
    pub async fn settle(
        &self,
        cart: &Cart,
        customer_id: Option<i64>,
        redemption: RedemptionRequest,
    ) -> SettlementResult<SettlementReceipt> {
        tracing::info!(
            customer_id = ?customer_id,
            lines = cart.lines.len(),
            requested_points = redemption.points,
            "Settlement started"
        );
        let plan = self.prepare(cart, customer_id, redemption).await?;
        self.commit(plan).await
    }

    /// Read-only phase: price the cart and resolve redemption/earning
    pub async fn prepare(
        &self,
        cart: &Cart,
        customer_id: Option<i64>,
        redemption: RedemptionRequest,
    ) -> SettlementResult<SettlementPlan> {
        let priced = pricing::price_cart(self.ledger.pool(), cart).await?;
        let subtotal = priced.original_total;

        let Some(customer_id) = customer_id else {
            return Ok(SettlementPlan {
                customer_id: None,
                final_payment: subtotal,
                cart: priced,
                notes: cart.notes.clone(),
                tier: MembershipTier::lowest(),
                points_to_use: 0,
                points_deduction: Decimal::ZERO,
                points_earned: 0,
            });
        };

        // No account yet: it is created inside commit, at the entry tier
        let (tier, balance) = match points_account::find(self.ledger.pool(), customer_id).await? {
            Some(account) => (account.tier, account.balance),
            None => (self.ledger.engine().tier_for(0), 0),
        };

        let resolved = self.resolve_redemption(subtotal, tier, balance, redemption.points)?;
        let final_payment = round_money(subtotal - resolved.value);
        let points_earned = self.ledger.earned_for(final_payment, tier)?;

        Ok(SettlementPlan {
            customer_id: Some(customer_id),
            cart: priced,
            notes: cart.notes.clone(),
            tier,
            points_to_use: resolved.points,
            points_deduction: resolved.value,
            final_payment,
            points_earned,
        })
    }

    /// Write phase: everything in the plan becomes visible together or not at all
    pub async fn commit(&self, plan: SettlementPlan) -> SettlementResult<SettlementReceipt> {
        match self.commit_plan(&plan).await {
            Ok(receipt) => {
                tracing::info!(
                    order_number = %receipt.order.order_number,
                    customer_id = ?plan.customer_id,
                    total = %receipt.order.final_payment_amount,
                    points_used = receipt.points_used,
                    points_earned = receipt.points_earned,
                    "Order settled"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(customer_id = ?plan.customer_id, error = %e, "Settlement aborted, rolled back");
                Err(e)
            }
        }
    }

    async fn commit_plan(&self, plan: &SettlementPlan) -> SettlementResult<SettlementReceipt> {
        let mut tx = self.ledger.pool().begin().await?;

        let order = self.insert_order(&mut tx, plan).await?;
        for line in &plan.cart.lines {
            order_repo::insert_item(
                &mut tx,
                order.id,
                line.menu_item_id,
                line.quantity,
                line.unit_price,
                line.subtotal,
            )
            .await?;
        }

        if let Some(customer_id) = plan.customer_id {
            self.ledger.ensure_account(&mut tx, customer_id).await?;

            if plan.points_to_use > 0 {
                self.ledger
                    .use_points(
                        &mut tx,
                        customer_id,
                        plan.points_to_use,
                        Some(order.id),
                        &format!("Redeemed on order {}", order.order_number),
                    )
                    .await?;
            }

            if plan.points_earned > 0 {
                self.ledger
                    .earn(
                        &mut tx,
                        customer_id,
                        plan.points_earned,
                        Some(order.id),
                        TransactionKind::Earned,
                        &format!("Earned on order {}", order.order_number),
                    )
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(SettlementReceipt {
            order: OrderSummary::from(&order),
            points_used: order.points_used,
            points_earned: order.points_earned,
        })
    }

    /// Insert the order header, regenerating the number once on a clash
    async fn insert_order(&self, tx: &mut Tx<'_>, plan: &SettlementPlan) -> SettlementResult<Order> {
        let mut retried = false;
        loop {
            let order_number = self.identifiers.next_order_number();
            let pickup_code = self.identifiers.next_pickup_code();
            let header = NewOrder {
                customer_id: plan.customer_id,
                order_number: &order_number,
                pickup_code: &pickup_code,
                original_total_price: plan.cart.original_total,
                points_deduction_amount: plan.points_deduction,
                final_payment_amount: plan.final_payment,
                points_used: plan.points_to_use,
                points_earned: plan.points_earned,
                member_level_at_time: plan.tier,
                notes: plan.notes.as_deref(),
            };

            // Savepoint: a failed INSERT must not poison the outer transaction
            let mut savepoint = sqlx::Connection::begin(&mut **tx).await?;
            match order_repo::insert(&mut savepoint, &header).await {
                Ok(order) => {
                    savepoint.commit().await?;
                    return Ok(order);
                }
                Err(RepoError::Duplicate(_)) => {
                    savepoint.rollback().await?;
                    if retried {
                        return Err(SettlementError::ConflictOnIdentifier(order_number));
                    }
                    tracing::warn!(%order_number, "Order number collision, regenerating");
                    retried = true;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read-only preview using the same pricing and redemption rules as settle
    pub async fn quote_points(
        &self,
        cart: &Cart,
        customer_id: i64,
        requested_points: i64,
    ) -> SettlementResult<PointsQuote> {
        let priced = pricing::price_cart(self.ledger.pool(), cart).await?;
        let account = self.ledger.account(customer_id).await?;
        let subtotal = priced.original_total;

        let resolved = self.resolve_redemption(subtotal, account.tier, account.balance, requested_points)?;
        let final_total = round_money(subtotal - resolved.value);

        Ok(PointsQuote {
            original_total: subtotal,
            max_usable_points: resolved.max_usable,
            points_to_use: resolved.points,
            points_value: resolved.value,
            final_total,
            estimated_points_earned: self.ledger.earned_for(final_total, account.tier)?,
            balance: account.balance,
            balance_after_usage: account.balance - resolved.points,
        })
    }

    /// Clamp to what the tier and balance allow; anything not redeemable
    /// becomes a zero redemption instead of failing the order
    fn resolve_redemption(
        &self,
        subtotal: Decimal,
        tier: MembershipTier,
        balance: i64,
        requested: i64,
    ) -> SettlementResult<Redemption> {
        let max_usable = self.ledger.max_usable(subtotal, tier, balance)?;
        if requested <= 0 {
            return Ok(Redemption {
                max_usable,
                ..Redemption::NONE
            });
        }

        // max_usable never exceeds the balance
        let clamped = requested.min(max_usable);
        debug_assert!(clamped <= balance);

        match self.ledger.redeemable(clamped, tier, subtotal) {
            Ok(value) => Ok(Redemption {
                max_usable,
                points: clamped,
                value,
            }),
            Err(PointsError::BelowMinimumRedemption { requested, minimum }) => {
                tracing::debug!(requested, minimum, "Redemption below minimum, charging full total");
                Ok(Redemption {
                    max_usable,
                    ..Redemption::NONE
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
