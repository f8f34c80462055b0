use serde::{Deserialize, Serialize};

use crate::Rejection;

use super::{
    progress::ProgressStore,
    session::LevelSession,
};

/// Consumable effects a player can trigger during play.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    /// Matches one random unmatched pair.
    #[display("bomb")]
    Bomb,
    /// Reveals every unmatched card for a few seconds.
    #[display("glimpse")]
    #[serde(alias = "clock")]
    Glimpse,
    /// Completes the level immediately.
    #[display("skip")]
    Skip,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 3] = [PowerupKind::Bomb, PowerupKind::Glimpse, PowerupKind::Skip];
}

/// Shop prices, in currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupPrices {
    pub bomb: u32,
    pub glimpse: u32,
    pub skip: u32,
}

impl Default for PowerupPrices {
    fn default() -> Self {
        Self {
            bomb: 50,
            glimpse: 100,
            skip: 600,
        }
    }
}

impl PowerupPrices {
    #[must_use]
    pub fn price(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::Bomb => self.bomb,
            PowerupKind::Glimpse => self.glimpse,
            PowerupKind::Skip => self.skip,
        }
    }
}

/// What an applied power-up did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PowerupOutcome {
    Bomb {
        slots: [usize; 2],
        completed: bool,
    },
    Glimpse {
        revealed: usize,
    },
    Skip {
        forced_pairs: usize,
    },
}

/// How a power-up request was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Payment {
    Inventory,
    Currency(u32),
}

impl Payment {
    /// Returns what was paid for `kind` to `store`.
    pub fn refund<S>(self, store: &mut S, kind: PowerupKind)
    where
        S: ProgressStore + ?Sized,
    {
        match self {
            Payment::Inventory => store.grant_powerup(kind, 1),
            Payment::Currency(amount) => store.credit_currency(amount),
        }
    }
}

/// Result of a successful [`PowerupController::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerupReceipt {
    pub outcome: PowerupOutcome,
    pub payment: Payment,
}

/// Pays for power-ups and applies them to a session.
///
/// Payment and effect are one step from the caller's point of view: the
/// request is validated against the session before anything is spent, an
/// owned item is used before currency, and the payment is refunded if the
/// effect cannot be applied.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use flipmatch_engine::{
///     LevelCatalog, LevelSession, MemoryProgressStore, Payment, PowerupController, PowerupKind,
/// };
///
/// let level = *LevelCatalog::standard().get(5).unwrap();
/// let mut store = MemoryProgressStore::default().with_currency(120);
/// let mut session = LevelSession::new(&level, &mut store).unwrap();
/// session.advance(Duration::from_secs(10));
///
/// let controller = PowerupController::default();
/// let receipt = controller.request(&mut session, PowerupKind::Bomb).unwrap();
/// assert_eq!(receipt.payment, Payment::Currency(50));
/// assert_eq!(session.matched().len(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerupController {
    prices: PowerupPrices,
}

impl PowerupController {
    #[must_use]
    pub fn new(prices: PowerupPrices) -> Self {
        Self { prices }
    }

    #[must_use]
    pub fn prices(&self) -> &PowerupPrices {
        &self.prices
    }

    /// Validates, pays for and applies `kind` to `session`.
    pub fn request<S>(
        &self,
        session: &mut LevelSession<S>,
        kind: PowerupKind,
    ) -> Result<PowerupReceipt, Rejection>
    where
        S: ProgressStore,
    {
        session.check_powerup(kind)?;

        let price = self.prices.price(kind);
        let payment = if session.store_mut().take_powerup(kind) {
            Payment::Inventory
        } else if session.store_mut().debit_currency(price) {
            Payment::Currency(price)
        } else {
            let balance = session.store().progress().currency;
            log::debug!("cannot afford {kind}: price {price}, balance {balance}");
            return Err(Rejection::InsufficientResources {
                kind,
                price,
                balance,
            });
        };

        // Only fails if the effect disagrees with `check_powerup` above.
        match session.apply_powerup(kind) {
            Ok(outcome) => Ok(PowerupReceipt { outcome, payment }),
            Err(rejection) => {
                log::warn!("refunding {kind} after failed application: {rejection}");
                payment.refund(session.store_mut(), kind);
                Err(rejection)
            }
        }
    }

    /// Buys `count` items of `kind` into the inventory.
    ///
    /// Either the whole purchase succeeds or nothing is debited.
    pub fn purchase<S>(&self, store: &mut S, kind: PowerupKind, count: u32) -> Result<(), Rejection>
    where
        S: ProgressStore + ?Sized,
    {
        let price = self.prices.price(kind).saturating_mul(count);
        if !store.debit_currency(price) {
            return Err(Rejection::InsufficientResources {
                kind,
                price,
                balance: store.progress().currency,
            });
        }
        store.grant_powerup(kind, count);
        log::info!("purchased {count} x {kind} for {price}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::MemoryProgressStore;

    use super::*;

    #[test]
    fn test_default_prices() {
        let prices = PowerupPrices::default();
        assert_eq!(prices.price(PowerupKind::Bomb), 50);
        assert_eq!(prices.price(PowerupKind::Glimpse), 100);
        assert_eq!(prices.price(PowerupKind::Skip), 600);
    }

    #[test]
    fn test_purchase() {
        let controller = PowerupController::default();
        let mut store = MemoryProgressStore::default().with_currency(220);
        controller
            .purchase(&mut store, PowerupKind::Glimpse, 2)
            .unwrap();
        assert_eq!(store.get().currency, 20);
        assert_eq!(store.get().powerup_inventory.glimpse, 2);

        let err = controller
            .purchase(&mut store, PowerupKind::Bomb, 1)
            .unwrap_err();
        assert_eq!(
            err,
            Rejection::InsufficientResources {
                kind: PowerupKind::Bomb,
                price: 50,
                balance: 20
            }
        );
        assert_eq!(store.get().powerup_inventory.bomb, 0);
    }

    #[test]
    fn test_refund_restores_what_was_paid() {
        let mut store = MemoryProgressStore::default()
            .with_currency(100)
            .with_powerups(PowerupKind::Skip, 1);

        assert!(store.take_powerup(PowerupKind::Skip));
        Payment::Inventory.refund(&mut store, PowerupKind::Skip);
        assert_eq!(store.get().powerup_inventory.skip, 1);

        assert!(store.debit_currency(50));
        Payment::Currency(50).refund(&mut store, PowerupKind::Bomb);
        assert_eq!(store.get().currency, 100);
        assert_eq!(store.get().powerup_inventory.bomb, 0);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(PowerupKind::Glimpse.to_string(), "glimpse");
        let kind: PowerupKind = serde_json::from_str("\"clock\"").unwrap();
        assert_eq!(kind, PowerupKind::Glimpse);
        assert_eq!(serde_json::to_string(&PowerupKind::Skip).unwrap(), "\"skip\"");
    }
}
