use std::fmt;

use serde::{Deserialize, Serialize};

/// Minor units per whole tez.
pub const MUTEZ_PER_TEZ: u64 = 1_000_000;

/// An amount in mutez, the ledger's smallest indivisible unit.
///
/// Every amount sent to the contract is a `Mutez`. Tez values only exist as
/// display strings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Mutez(pub u64);

impl Mutez {
    pub const ZERO: Mutez = Mutez(0);

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Price of `quantity` units at this unit price, `None` on overflow.
    pub fn checked_mul(self, quantity: u64) -> Option<Mutez> {
        self.0.checked_mul(quantity).map(Mutez)
    }

    pub fn checked_add(self, other: Mutez) -> Option<Mutez> {
        self.0.checked_add(other.0).map(Mutez)
    }

    pub fn checked_sub(self, other: Mutez) -> Option<Mutez> {
        self.0.checked_sub(other.0).map(Mutez)
    }

    /// Exact decimal rendering in tez with trailing zeros trimmed
    /// (`2_500_000` → `"2.5"`, `3_000_000` → `"3"`).
    pub fn to_tez_string(self) -> String {
        let whole = self.0 / MUTEZ_PER_TEZ;
        let frac = self.0 % MUTEZ_PER_TEZ;
        if frac == 0 {
            return whole.to_string();
        }
        let digits = format!("{frac:06}");
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl fmt::Display for Mutez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mutez", self.0)
    }
}
