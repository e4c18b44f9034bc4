// 1.0: the primitive vocabulary of the whole crate: ids, prices, leverage,
// timestamps. identity types are newtypes so the compiler catches mixups;
// scaled money amounts stay raw u128/i128 (see fixed.rs for SCALE).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(pub u32);

/// Oracle key for the underlying team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

// 1.1: scaled value types. Amount is an unsigned collateral/liquidity quantity,
// SignedAmount a position size or value flow (positive = long / credit).
// both carry the 1e18 fixed-point scale from fixed.rs.
pub type Amount = u128;
pub type SignedAmount = i128;

// Long = profit when the win probability rises. Short = profit when it falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn sign(&self) -> i128 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn of(size: SignedAmount) -> Option<Self> {
        if size > 0 {
            Some(Side::Long)
        } else if size < 0 {
            Some(Side::Short)
        } else {
            None
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

// 1.2: win-probability price on the integer [0, 1000] axis. 500 = coin flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(u32);

impl Price {
    pub const FLOOR: Price = Price(0);
    pub const CENTER: Price = Price(500);
    pub const CEIL: Price = Price(1000);

    /// Full span of the price axis. Notional math divides by this.
    pub const TICKS: u32 = 1000;

    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        if value <= Self::TICKS {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: u32) -> Self {
        debug_assert!(value <= Self::TICKS);
        Self(value)
    }

    /// Clamp an intermediate fixed-point result onto the axis.
    pub fn clamped(value: i128) -> Self {
        Self(value.clamp(0, Self::TICKS as i128) as u32)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn abs_diff(&self, other: Price) -> u32 {
        self.0.abs_diff(other.0)
    }

    /// Signed tick move from `from` to `self`.
    pub fn delta_from(&self, from: Price) -> i128 {
        self.0 as i128 - from.0 as i128
    }

    /// Midpoint of two prices, rounding down.
    pub fn midpoint(&self, other: Price) -> Price {
        Self((self.0 + other.0) / 2)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: leverage multiplier. whole multiples only, floor at 1x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Leverage(u32);

impl Leverage {
    pub const MIN: Leverage = Leverage(1);

    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        if value >= Self::MIN.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: u32) -> Self {
        debug_assert!(value >= Self::MIN.0);
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

// 1.4: second-resolution timestamp supplied by the host ledger with each call.
// the core never reads a wall clock; replicas must agree on every derived value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whole days since the epoch. The funding cap windows key off this.
    pub fn day_index(&self) -> u64 {
        self.0 / 86_400
    }
}
