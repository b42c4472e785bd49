//! Record-low and record-high prices per edition.
//!
//! The merge is pure; persistence lives in
//! [`LedgerFile`](crate::stores::LedgerFile).
//!
//! Entries are keyed by the edition's decimal ISBN only. Two conditions of
//! the same edition therefore widen the same range.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::catalog::Book;

/// Inclusive `[min, max]` of every price observed for one key.
///
/// Serialized as a two-element array. Deserialization goes through
/// [`PriceRange::new`], so `[15, 10]` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)")]
pub struct PriceRange(f64, f64);

impl PriceRange {
    /// Range of a single observation.
    pub fn point(price: f64) -> Self {
        Self(price, price)
    }

    /// `None` unless both bounds are finite and `min <= max`.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite() && min <= max).then_some(Self(min, max))
    }

    pub fn min(&self) -> f64 {
        self.0
    }

    pub fn max(&self) -> f64 {
        self.1
    }

    pub fn contains(&self, price: f64) -> bool {
        self.0 <= price && price <= self.1
    }

    /// Smallest range covering `self` and `price`.
    pub fn widen(self, price: f64) -> Self {
        Self(self.0.min(price), self.1.max(price))
    }
}

impl TryFrom<(f64, f64)> for PriceRange {
    type Error = String;

    fn try_from((min, max): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(min, max).ok_or_else(|| format!("invalid price range [{}, {}]", min, max))
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}]", self.0, self.1)
    }
}

/// Mapping from decimal ISBN to its observed price range.
pub type PriceLedger = BTreeMap<String, PriceRange>;

/// How one observation moved the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceChange {
    /// First price ever seen for this key
    NewRecord { key: String, price: f64 },
    /// Price below the previous minimum
    NewLow {
        key: String,
        previous: PriceRange,
        price: f64,
    },
    /// Price above the previous maximum
    NewHigh {
        key: String,
        previous: PriceRange,
        price: f64,
    },
}

impl PriceChange {
    pub fn key(&self) -> &str {
        match self {
            PriceChange::NewRecord { key, .. }
            | PriceChange::NewLow { key, .. }
            | PriceChange::NewHigh { key, .. } => key,
        }
    }
}

impl fmt::Display for PriceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceChange::NewRecord { key, price } => {
                write!(f, "{}: first seen at {:.2}", key, price)
            }
            PriceChange::NewLow { key, previous, price } => {
                write!(f, "{}: new low {:.2} (was {})", key, price, previous)
            }
            PriceChange::NewHigh { key, previous, price } => {
                write!(f, "{}: new high {:.2} (was {})", key, price, previous)
            }
        }
    }
}

/// Fold every condition price of `catalog` into a copy of `current`.
pub fn merge(current: &PriceLedger, catalog: &[Book]) -> PriceLedger {
    merge_with_changes(current, catalog).0
}

/// Like [`merge`], also reporting each observation that moved a bound.
///
/// Observations are applied in catalog order, so one key can report both
/// a `NewRecord` and a later `NewLow`/`NewHigh` within the same catalog.
pub fn merge_with_changes(
    current: &PriceLedger,
    catalog: &[Book],
) -> (PriceLedger, Vec<PriceChange>) {
    let mut ledger = current.clone();
    let mut changes = Vec::new();

    let observations = catalog
        .iter()
        .flat_map(|book| book.editions.iter())
        .flat_map(|edition| {
            let key = edition.ledger_key();
            edition.conditions.iter().map(move |c| (key.clone(), c.thrift_price))
        });

    for (key, price) in observations {
        match ledger.get(&key).copied() {
            None => {
                ledger.insert(key.clone(), PriceRange::point(price));
                changes.push(PriceChange::NewRecord { key, price });
            }
            Some(previous) => {
                if price < previous.min() {
                    changes.push(PriceChange::NewLow {
                        key: key.clone(),
                        previous,
                        price,
                    });
                } else if price > previous.max() {
                    changes.push(PriceChange::NewHigh {
                        key: key.clone(),
                        previous,
                        price,
                    });
                }
                ledger.insert(key, previous.widen(price));
            }
        }
    }

    (ledger, changes)
}
