//! crates/logging/src/options.rs
//! Header-field option flags and their effective interpretation.

use std::ops::{BitOr, BitOrAssign};

use crate::error::{Error, Result};

/// Bit flags suppressing header fields for one destination.
///
/// The empty set ([`OptionSet::ALL`]) renders every field. Flags only ever
/// remove output; [`OptionSet::MSG_ONLY`] removes every header field and
/// overrides the individual flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub struct OptionSet(u32);

impl OptionSet {
    /// Include every header field.
    pub const ALL: Self = Self(0x0000_0000);
    /// Omit the timestamp (implies [`OptionSet::NO_MSEC`]).
    pub const NO_TIME: Self = Self(0x0000_0100);
    /// Omit milliseconds from the timestamp.
    pub const NO_MSEC: Self = Self(0x0000_0200);
    /// Omit the hostname.
    pub const NO_HOST: Self = Self(0x0000_0400);
    /// Omit the level tag.
    pub const NO_LEVEL: Self = Self(0x0000_0800);
    /// Omit the process name.
    pub const NO_NAME: Self = Self(0x0000_1000);
    /// Omit the process id.
    pub const NO_PID: Self = Self(0x0000_2000);
    /// Omit the thread id.
    pub const NO_TID: Self = Self(0x0000_4000);
    /// Every field-suppressing flag at once.
    pub const MSG_ONLY: Self = Self(0x0000_7f00);
    /// Skip the session and rotation banners in log files.
    pub const NO_HEADER: Self = Self(0x0001_0000);
    /// Placeholder resolved to the destination's default options.
    pub const DEFAULT: Self = Self(0x0010_0000);

    const VALID: u32 = Self::MSG_ONLY.0 | Self::NO_HEADER.0;

    /// Validates raw bits, accepting known flags and the default sentinel.
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits == Self::DEFAULT.0 || bits & !Self::VALID == 0 {
            Ok(Self(bits))
        } else {
            Err(Error::InvalidOptions(bits))
        }
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` for the default sentinel.
    pub const fn is_default(self) -> bool {
        self.0 == Self::DEFAULT.0
    }

    /// Returns `true` if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags set in either.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Replaces the default sentinel with `fallback`.
    pub const fn or_default(self, fallback: Self) -> Self {
        if self.is_default() { fallback } else { self }
    }

    /// Returns `true` when file banners should be written.
    pub const fn wants_file_header(self) -> bool {
        !self.contains(Self::NO_HEADER)
    }
}

impl TryFrom<u32> for OptionSet {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl From<OptionSet> for u32 {
    fn from(set: OptionSet) -> Self {
        set.0
    }
}

impl BitOr for OptionSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OptionSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Header fields a destination renders, after option interpretation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct HeaderFields {
    /// Wall-clock time.
    pub time: bool,
    /// Millisecond suffix on the time.
    pub msec: bool,
    /// Hostname.
    pub host: bool,
    /// Bracketed level tag.
    pub level: bool,
    /// Process name.
    pub name: bool,
    /// Process id.
    pub pid: bool,
    /// Thread id.
    pub tid: bool,
}

impl HeaderFields {
    /// Returns `true` when no header field is rendered.
    pub const fn is_empty(&self) -> bool {
        !(self.time || self.host || self.level || self.name || self.pid || self.tid)
    }
}

/// Decides which header fields a destination with `options` renders.
pub const fn effective_options(options: OptionSet) -> HeaderFields {
    if options.is_default() || options.contains(OptionSet::MSG_ONLY) {
        return HeaderFields {
            time: false,
            msec: false,
            host: false,
            level: false,
            name: false,
            pid: false,
            tid: false,
        };
    }

    let time = !options.contains(OptionSet::NO_TIME);
    HeaderFields {
        time,
        msec: time && !options.contains(OptionSet::NO_MSEC),
        host: !options.contains(OptionSet::NO_HOST),
        level: !options.contains(OptionSet::NO_LEVEL),
        name: !options.contains(OptionSet::NO_NAME),
        pid: !options.contains(OptionSet::NO_PID),
        tid: !options.contains(OptionSet::NO_TID),
    }
}
