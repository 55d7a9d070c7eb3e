//! PTP timestamp representation and conversions.
//!
//! Kernel timestamps arrive as `struct timespec`, switch fabrics count in
//! fixed-width ticks, and the PTP correction field carries plain
//! nanoseconds. This module converts between all three.

use std::time::Duration;

/// IEEE 1588 PTP timestamp: seconds + nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PtpTimestamp {
    /// Seconds since the epoch of the clock that produced the timestamp.
    pub seconds: u64,
    /// Nanoseconds within the current second (`0..999_999_999`).
    pub nanoseconds: u32,
}

impl PtpTimestamp {
    /// Nanoseconds per second.
    pub const NANOS_PER_SEC: u32 = 1_000_000_000;

    /// Zero timestamp.
    pub const ZERO: Self = Self {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Create a new timestamp, clamping nanoseconds to valid range.
    #[must_use]
    pub fn new(seconds: u64, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds: nanoseconds.min(Self::NANOS_PER_SEC - 1),
        }
    }

    /// Whether this is the all-zero timestamp.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Convert a kernel `timespec`.
    ///
    /// Negative fields never come out of the timestamping subsystem; they are
    /// clamped to zero rather than wrapped.
    #[must_use]
    pub fn from_timespec(ts: &libc::timespec) -> Self {
        let seconds = u64::try_from(ts.tv_sec).unwrap_or(0);
        let nanoseconds = u32::try_from(ts.tv_nsec).unwrap_or(0);
        Self::new(seconds, nanoseconds)
    }

    /// Convert to a kernel `timespec`.
    #[must_use]
    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_lossless,
        reason = "Seconds fit in time_t for any clock this crate reads, nanoseconds fit in c_long"
    )]
    pub fn to_timespec(&self) -> libc::timespec {
        // SAFETY: timespec is plain old data; all-zero is a valid value and
        // covers any padding fields on targets that have them.
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        ts.tv_sec = self.seconds as libc::time_t;
        ts.tv_nsec = self.nanoseconds as libc::c_long;
        ts
    }

    /// Convert to total nanoseconds since epoch.
    #[must_use]
    pub fn to_nanos(&self) -> u64 {
        self.seconds
            .wrapping_mul(u64::from(Self::NANOS_PER_SEC))
            .wrapping_add(u64::from(self.nanoseconds))
    }

    /// Create from total nanoseconds since epoch.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Remainder of a division by 1e9 always fits in u32"
    )]
    pub fn from_nanos(nanos: u64) -> Self {
        Self {
            seconds: nanos / u64::from(Self::NANOS_PER_SEC),
            nanoseconds: (nanos % u64::from(Self::NANOS_PER_SEC)) as u32,
        }
    }

    /// Convert to a count of `tick_ns`-nanosecond ticks, truncating.
    ///
    /// # Panics
    /// Panics if `tick_ns` is zero.
    #[must_use]
    pub fn to_ticks(&self, tick_ns: u64) -> u64 {
        assert!(tick_ns > 0, "tick length must be non-zero");
        self.to_nanos() / tick_ns
    }

    /// Create from a count of `tick_ns`-nanosecond ticks.
    #[must_use]
    pub fn from_ticks(ticks: u64, tick_ns: u64) -> Self {
        Self::from_nanos(ticks.wrapping_mul(tick_ns))
    }

    /// Signed difference in nanoseconds: `self - other`.
    #[must_use]
    pub fn diff_nanos(&self, other: &Self) -> i128 {
        i128::from(self.to_nanos()) - i128::from(other.to_nanos())
    }

    /// Convert to a `Duration` (elapsed time).
    #[must_use]
    pub fn to_duration(&self) -> Duration {
        Duration::new(self.seconds, self.nanoseconds)
    }

    /// Create from a `Duration`.
    #[must_use]
    pub fn from_duration(d: Duration) -> Self {
        Self {
            seconds: d.as_secs(),
            nanoseconds: d.subsec_nanos(),
        }
    }
}

impl std::fmt::Display for PtpTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanoseconds)
    }
}

impl std::ops::Sub for PtpTimestamp {
    type Output = i128;

    fn sub(self, rhs: Self) -> Self::Output {
        self.diff_nanos(&rhs)
    }
}

impl From<Duration> for PtpTimestamp {
    fn from(d: Duration) -> Self {
        Self::from_duration(d)
    }
}

impl From<PtpTimestamp> for Duration {
    fn from(ts: PtpTimestamp) -> Self {
        ts.to_duration()
    }
}

impl From<libc::timespec> for PtpTimestamp {
    fn from(ts: libc::timespec) -> Self {
        Self::from_timespec(&ts)
    }
}
