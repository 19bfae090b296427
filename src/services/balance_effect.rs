//! Signed balance effects of transactions.
//!
//! A transaction stores only a positive amount; its effect on balances is
//! derived from its kind:
//!
//! | kind     | primary account | related account |
//! |----------|-----------------|-----------------|
//! | expense  | `-amount`       | -               |
//! | income   | `+amount`       | -               |
//! | transfer | `-amount`       | `+amount`       |
//!
//! Rolling a transaction back applies the exact negation of its effect to the
//! references it was written with. Editing is rollback of the old effect
//! followed by the new effect, so the result never depends on what the
//! transaction looked like before.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::error::AppError;
use crate::models::transaction::{Transaction, TransactionKind};

/// One signed change to one account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDelta {
    pub account_id: i64,
    pub delta: Decimal,
}

/// The ordered balance deltas of a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    deltas: Vec<BalanceDelta>,
}

impl Effect {
    /// Effect of a transaction of `kind` moving `amount` on the given references.
    ///
    /// # Errors
    ///
    /// `Corrupted` when the references do not fit the kind: a transfer without
    /// a related account, or an expense/income carrying one.
    pub fn of(
        kind: TransactionKind,
        amount: Decimal,
        account_id: i64,
        related_account_id: Option<i64>,
    ) -> Result<Self, AppError> {
        let deltas = match (kind, related_account_id) {
            (TransactionKind::Expense, None) => vec![BalanceDelta {
                account_id,
                delta: -amount,
            }],
            (TransactionKind::Income, None) => vec![BalanceDelta {
                account_id,
                delta: amount,
            }],
            (TransactionKind::Transfer, Some(to)) => vec![
                BalanceDelta {
                    account_id,
                    delta: -amount,
                },
                BalanceDelta {
                    account_id: to,
                    delta: amount,
                },
            ],
            (TransactionKind::Transfer, None) => {
                return Err(AppError::Corrupted(
                    "transfer without related account".to_string(),
                ));
            }
            (kind, Some(_)) => {
                return Err(AppError::Corrupted(format!(
                    "{kind} with related account"
                )));
            }
        };

        Ok(Self { deltas })
    }

    /// Effect of a stored transaction.
    pub fn of_transaction(tx: &Transaction) -> Result<Self, AppError> {
        Self::of(tx.kind, tx.amount, tx.account_id, tx.related_account_id)
    }

    /// The exact negation, applied to the same accounts.
    pub fn inverse(&self) -> Self {
        Self {
            deltas: self
                .deltas
                .iter()
                .map(|d| BalanceDelta {
                    account_id: d.account_id,
                    delta: -d.delta,
                })
                .collect(),
        }
    }

    pub fn deltas(&self) -> &[BalanceDelta] {
        &self.deltas
    }

    pub fn accounts(&self) -> impl Iterator<Item = i64> + '_ {
        self.deltas.iter().map(|d| d.account_id)
    }
}

/// Deltas that undo `old` and then apply `new`, in that order.
pub fn rollback_then_apply(old: &Effect, new: &Effect) -> Vec<BalanceDelta> {
    old.inverse()
        .deltas
        .into_iter()
        .chain(new.deltas.iter().copied())
        .collect()
}

/// Every account touched by the effects, ascending and without duplicates.
///
/// Locking in this order keeps two operations on overlapping accounts from
/// deadlocking each other.
pub fn lock_order<'a>(effects: impl IntoIterator<Item = &'a Effect>) -> Vec<i64> {
    effects
        .into_iter()
        .flat_map(Effect::accounts)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn net_by_account(deltas: &[BalanceDelta]) -> BTreeMap<i64, Decimal> {
        let mut net = BTreeMap::new();
        apply(&mut net, deltas);
        net
    }

    fn apply(balances: &mut BTreeMap<i64, Decimal>, deltas: &[BalanceDelta]) {
        for d in deltas {
            *balances.entry(d.account_id).or_insert(Decimal::ZERO) += d.delta;
        }
    }

    #[test]
    fn expense_update_delete_scenario() {
        let mut balances = BTreeMap::from([(1, dec("100.00"))]);

        let created = Effect::of(TransactionKind::Expense, dec("30.00"), 1, None).unwrap();
        apply(&mut balances, created.deltas());
        assert_eq!(balances[&1].to_string(), "70.00");

        let edited = Effect::of(TransactionKind::Expense, dec("50.00"), 1, None).unwrap();
        apply(&mut balances, &rollback_then_apply(&created, &edited));
        assert_eq!(balances[&1].to_string(), "50.00");

        apply(&mut balances, edited.inverse().deltas());
        assert_eq!(balances[&1].to_string(), "100.00");
    }

    #[test]
    fn income_raises_the_balance() {
        let effect = Effect::of(TransactionKind::Income, dec("12.34"), 4, None).unwrap();
        assert_eq!(
            effect.deltas(),
            &[BalanceDelta {
                account_id: 4,
                delta: dec("12.34")
            }]
        );
    }

    #[test]
    fn transfer_is_symmetric_and_conserves_money() {
        let effect = Effect::of(TransactionKind::Transfer, dec("25.00"), 1, Some(2)).unwrap();
        let net = net_by_account(effect.deltas());

        assert_eq!(net[&1], dec("-25.00"));
        assert_eq!(net[&2], dec("25.00"));
        assert_eq!(net.values().copied().sum::<Decimal>(), Decimal::ZERO);
    }

    #[test]
    fn inverse_cancels_the_effect() {
        let effect = Effect::of(TransactionKind::Transfer, dec("7.01"), 3, Some(9)).unwrap();
        let mut all = effect.deltas().to_vec();
        all.extend_from_slice(effect.inverse().deltas());

        assert!(net_by_account(&all).values().all(|v| v.is_zero()));
        assert_eq!(effect.inverse().inverse(), effect);
    }

    #[test]
    fn update_equals_delete_then_fresh_create() {
        let start = BTreeMap::from([(1, dec("500.00")), (2, dec("10.00")), (3, dec("0"))]);
        let old = Effect::of(TransactionKind::Transfer, dec("40.00"), 1, Some(2)).unwrap();
        let new = Effect::of(TransactionKind::Transfer, dec("15.50"), 1, Some(3)).unwrap();

        let mut via_update = start.clone();
        apply(&mut via_update, old.deltas());
        apply(&mut via_update, &rollback_then_apply(&old, &new));

        let mut via_recreate = start.clone();
        apply(&mut via_recreate, old.deltas());
        apply(&mut via_recreate, old.inverse().deltas());
        apply(&mut via_recreate, new.deltas());

        assert_eq!(via_update, via_recreate);
        assert_eq!(via_update[&2], dec("10.00"));
        assert_eq!(via_update[&3], dec("15.50"));
    }

    #[test]
    fn rollback_precedes_reapply() {
        let old = Effect::of(TransactionKind::Expense, dec("5"), 1, None).unwrap();
        let new = Effect::of(TransactionKind::Expense, dec("8"), 2, None).unwrap();

        let deltas = rollback_then_apply(&old, &new);
        assert_eq!(
            deltas,
            vec![
                BalanceDelta {
                    account_id: 1,
                    delta: dec("5")
                },
                BalanceDelta {
                    account_id: 2,
                    delta: dec("-8")
                },
            ]
        );
    }

    #[test]
    fn references_must_fit_the_kind() {
        assert!(matches!(
            Effect::of(TransactionKind::Transfer, dec("1"), 1, None),
            Err(AppError::Corrupted(_))
        ));
        assert!(matches!(
            Effect::of(TransactionKind::Expense, dec("1"), 1, Some(2)),
            Err(AppError::Corrupted(_))
        ));
    }

    #[test]
    fn lock_order_is_sorted_and_unique() {
        let old = Effect::of(TransactionKind::Transfer, dec("1"), 9, Some(4)).unwrap();
        let new = Effect::of(TransactionKind::Transfer, dec("1"), 4, Some(7)).unwrap();
        assert_eq!(lock_order([&old, &new]), vec![4, 7, 9]);
    }
}
