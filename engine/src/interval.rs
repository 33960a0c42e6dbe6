//! Half-open time intervals.
//!
//! `[start, end)` semantics everywhere: an interval ending at 10:00 does not
//! overlap one starting at 10:00. Every availability check in the crate goes
//! through [`Interval::overlaps`].

use crate::{error::Result, Error, Timestamp};
use serde::{Deserialize, Serialize};

/// A non-empty half-open interval `[start, end)` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: Timestamp,
    end: Timestamp,
}

#[derive(Deserialize)]
struct RawInterval {
    start: Timestamp,
    end: Timestamp,
}

impl TryFrom<RawInterval> for Interval {
    type Error = Error;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Create an interval. Zero-length and inverted intervals are rejected.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// `s1 < e2 && s2 < e1`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely inside this interval.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Remove `busy` from `window`, returning the free pieces in order.
///
/// `busy` does not need to be sorted or disjoint.
pub fn subtract(window: &Interval, busy: &[Interval]) -> Vec<Interval> {
    let mut blocked: Vec<Interval> = busy.iter().filter(|b| b.overlaps(window)).copied().collect();
    blocked.sort_by_key(|b| b.start);

    let mut free = Vec::new();
    let mut cursor = window.start;
    for b in &blocked {
        if b.start > cursor {
            free.push(Interval {
                start: cursor,
                end: b.start.min(window.end),
            });
        }
        cursor = cursor.max(b.end);
        if cursor >= window.end {
            break;
        }
    }
    if cursor < window.end {
        free.push(Interval {
            start: cursor,
            end: window.end,
        });
    }
    free
}
