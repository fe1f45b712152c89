//! crates/logging/src/levels.rs
//! Severity levels and the bit-flag sets destinations filter on.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::error::{Error, Result};

/// Message severity, ordered from most to least urgent.
///
/// Each level owns one bit in a [`LevelSet`]; the discriminant is the bit
/// position, so `1 << level as u16` yields its mask.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Level {
    /// The system is unusable.
    Emergency = 0,
    /// Action must be taken immediately.
    Alert = 1,
    /// Critical conditions.
    Critical = 2,
    /// Error conditions.
    Error = 3,
    /// Warning conditions.
    Warning = 4,
    /// Normal but significant conditions.
    Notice = 5,
    /// Informational messages.
    Info = 6,
    /// Debugging output.
    Debug = 7,
}

impl Level {
    /// Every real level, most urgent first.
    pub const ALL: [Self; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    /// Bit position of this level inside a [`LevelSet`].
    pub const fn bit(self) -> u16 {
        self as u16
    }

    /// Single-bit mask for this level.
    pub const fn mask(self) -> u16 {
        1 << self.bit()
    }

    /// Four-character tag rendered in message headers.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Emergency => "emrg",
            Self::Alert => "alrt",
            Self::Critical => "crit",
            Self::Error => "erro",
            Self::Warning => "warn",
            Self::Notice => "noti",
            Self::Info => "info",
            Self::Debug => "debg",
        }
    }

    /// Looks up a level by its bit position.
    pub const fn from_bit(bit: u16) -> Option<Self> {
        match bit {
            0 => Some(Self::Emergency),
            1 => Some(Self::Alert),
            2 => Some(Self::Critical),
            3 => Some(Self::Error),
            4 => Some(Self::Warning),
            5 => Some(Self::Notice),
            6 => Some(Self::Info),
            7 => Some(Self::Debug),
            _ => None,
        }
    }

    /// Index into per-level tables.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A set of levels a destination accepts.
///
/// Valid values are subsets of [`LevelSet::ALL`], plus the
/// [`LevelSet::DEFAULT`] sentinel which configuration calls replace with the
/// destination's default set before storing it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u16", into = "u16"))]
pub struct LevelSet(u16);

impl LevelSet {
    /// No levels; a destination with this set is effectively disabled.
    pub const NONE: Self = Self(0x0000);
    /// Emergency only.
    pub const EMERGENCY: Self = Self(Level::Emergency.mask());
    /// Alert only.
    pub const ALERT: Self = Self(Level::Alert.mask());
    /// Critical only.
    pub const CRITICAL: Self = Self(Level::Critical.mask());
    /// Error only.
    pub const ERROR: Self = Self(Level::Error.mask());
    /// Warning only.
    pub const WARNING: Self = Self(Level::Warning.mask());
    /// Notice only.
    pub const NOTICE: Self = Self(Level::Notice.mask());
    /// Info only.
    pub const INFO: Self = Self(Level::Info.mask());
    /// Debug only.
    pub const DEBUG: Self = Self(Level::Debug.mask());
    /// Every real level.
    pub const ALL: Self = Self(0x00ff);
    /// Placeholder resolved to the destination's default levels.
    pub const DEFAULT: Self = Self(0x0100);

    /// Validates raw bits, accepting real-level subsets and the default sentinel.
    pub fn from_bits(bits: u16) -> Result<Self> {
        if bits == Self::DEFAULT.0 || bits & !Self::ALL.0 == 0 {
            Ok(Self(bits))
        } else {
            Err(Error::InvalidLevels(bits))
        }
    }

    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns `true` for the default sentinel.
    pub const fn is_default(self) -> bool {
        self.0 == Self::DEFAULT.0
    }

    /// Returns `true` when no level is admitted.
    pub const fn is_empty(self) -> bool {
        self.0 & Self::ALL.0 == 0
    }

    /// Returns `true` if `level` is a member.
    pub const fn contains(self, level: Level) -> bool {
        deliverable(level, self)
    }

    /// Replaces the default sentinel with `fallback`.
    pub const fn or_default(self, fallback: Self) -> Self {
        if self.is_default() { fallback } else { self }
    }

    /// Members of either set.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Every level from `level` up to [`Level::Emergency`].
    pub const fn at_least(level: Level) -> Self {
        Self((level.mask() << 1) - 1)
    }

    /// Iterates over the member levels, most urgent first.
    pub fn iter(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().filter(move |l| self.contains(*l))
    }
}

impl From<Level> for LevelSet {
    fn from(level: Level) -> Self {
        Self(level.mask())
    }
}

impl TryFrom<u16> for LevelSet {
    type Error = Error;

    fn try_from(bits: u16) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl From<LevelSet> for u16 {
    fn from(set: LevelSet) -> Self {
        set.0
    }
}

impl BitOr for LevelSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<Level> for LevelSet {
    type Output = Self;

    fn bitor(self, rhs: Level) -> Self {
        Self(self.0 | rhs.mask())
    }
}

impl BitOrAssign for LevelSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Decides whether a message at `level` reaches a destination holding `levels`.
#[inline]
pub const fn deliverable(level: Level, levels: LevelSet) -> bool {
    (1u16 << level.bit()) & levels.bits() != 0
}
