//! Sets of 64-bit integers represented as unions of closed intervals.
//!
//! A [`RangeSet`] is always kept in normal form: its intervals are sorted in
//! ascending order and no two of them overlap or touch.
//! For example, `{1..3} ∪ {4..6}` is stored as the single interval `{1..6}`.
//!
//! The empty set is the canonical "no possible value": a numeric expression
//! whose range becomes empty lives on an infeasible path.

use std::cmp::{max, min};
use std::fmt;

use crate::types::Width;
use crate::utils::{pairing2, MyHash};
use crate::value::RelationOp;

/// Closed interval `[lo, hi]` with `lo <= hi`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Range {
    lo: i64,
    hi: i64,
}

impl Range {
    /// Creates the interval `[lo, hi]`.
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi`.
    pub fn new(lo: i64, hi: i64) -> Self {
        assert!(lo <= hi, "Invalid range: {} > {}", lo, hi);
        Self { lo, hi }
    }

    pub fn point(value: i64) -> Self {
        Self { lo: value, hi: value }
    }

    pub fn lo(&self) -> i64 {
        self.lo
    }

    pub fn hi(&self) -> i64 {
        self.hi
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// Absolute values of an interval that does not contain `i64::MIN`.
    fn abs(&self) -> Range {
        if self.lo >= 0 {
            *self
        } else if self.hi <= 0 {
            Range::new(self.hi.saturating_neg(), self.lo.saturating_neg())
        } else {
            Range::new(0, max(self.lo.saturating_neg(), self.hi))
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == self.hi {
            write!(f, "{}", self.lo)
        } else {
            write!(f, "{}..{}", self.lo, self.hi)
        }
    }
}

/// Normalized union of disjoint, non-adjacent intervals.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct RangeSet {
    ranges: Vec<Range>,
}

impl RangeSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// The whole 64-bit domain.
    pub fn all() -> Self {
        Self::range(i64::MIN, i64::MAX)
    }

    /// The single value `value`.
    pub fn point(value: i64) -> Self {
        Self {
            ranges: vec![Range::point(value)],
        }
    }

    /// The interval `[lo, hi]`, or the empty set if `lo > hi`.
    pub fn range(lo: i64, hi: i64) -> Self {
        if lo > hi {
            Self::empty()
        } else {
            Self {
                ranges: vec![Range::new(lo, hi)],
            }
        }
    }

    /// All values of a signed integer domain.
    pub fn from_width(width: Width) -> Self {
        Self::range(width.min_value(), width.max_value())
    }

    /// Builds a set from arbitrary (possibly overlapping, unordered) intervals.
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = Range>,
    {
        Self::normalize(ranges.into_iter().collect())
    }

    fn normalize(mut ranges: Vec<Range>) -> Self {
        ranges.sort_unstable();

        let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
        for r in ranges {
            match merged.last_mut() {
                // `last.hi < r.lo` guarantees `last.hi + 1` does not overflow.
                Some(last) if r.lo <= last.hi || r.lo == last.hi + 1 => {
                    last.hi = max(last.hi, r.hi);
                }
                _ => merged.push(r),
            }
        }

        let result = Self { ranges: merged };
        result.check_invariant();
        result
    }

    fn check_invariant(&self) {
        for w in self.ranges.windows(2) {
            assert!(
                w[0].hi < w[1].lo && w[0].hi + 1 < w[1].lo,
                "Ranges {} and {} overlap or touch",
                w[0],
                w[1]
            );
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The intervals of this set in ascending order.
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Smallest value of the set.
    ///
    /// # Panics
    ///
    /// Panics if the set is empty.
    pub fn min(&self) -> i64 {
        match self.ranges.first() {
            Some(r) => r.lo,
            None => panic!("min() called on an empty range set"),
        }
    }

    /// Largest value of the set.
    ///
    /// # Panics
    ///
    /// Panics if the set is empty.
    pub fn max(&self) -> i64 {
        match self.ranges.last() {
            Some(r) => r.hi,
            None => panic!("max() called on an empty range set"),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.ranges.iter().any(|r| r.contains(value))
    }

    /// The only value of a one-point set.
    pub fn constant_value(&self) -> Option<i64> {
        match self.ranges.as_slice() {
            [r] if r.lo == r.hi => Some(r.lo),
            _ => None,
        }
    }

    pub fn union(&self, other: &RangeSet) -> RangeSet {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut ranges = Vec::with_capacity(self.ranges.len() + other.ranges.len());
        ranges.extend_from_slice(&self.ranges);
        ranges.extend_from_slice(&other.ranges);
        Self::normalize(ranges)
    }

    pub fn intersect(&self, other: &RangeSet) -> RangeSet {
        let mut ranges = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = self.ranges[i];
            let b = other.ranges[j];
            let lo = max(a.lo, b.lo);
            let hi = min(a.hi, b.hi);
            if lo <= hi {
                ranges.push(Range::new(lo, hi));
            }
            if a.hi < b.hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        let result = Self { ranges };
        result.check_invariant();
        result
    }

    /// This set with `value` removed.
    pub fn without(&self, value: i64) -> RangeSet {
        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        for r in &self.ranges {
            if !r.contains(value) {
                ranges.push(*r);
                continue;
            }
            if r.lo < value {
                ranges.push(Range::new(r.lo, value - 1));
            }
            if value < r.hi {
                ranges.push(Range::new(value + 1, r.hi));
            }
        }
        let result = Self { ranges };
        result.check_invariant();
        result
    }

    /// Values `x` such that `x op y` holds for at least one `y` in this set.
    pub fn from_relation(&self, op: RelationOp) -> RangeSet {
        if self.is_empty() {
            return RangeSet::empty();
        }
        match op {
            RelationOp::Eq | RelationOp::EqEq => self.clone(),
            RelationOp::Ne => match self.constant_value() {
                Some(value) => RangeSet::all().without(value),
                None => RangeSet::all(),
            },
            RelationOp::Lt => match self.max().checked_sub(1) {
                Some(hi) => RangeSet::range(i64::MIN, hi),
                None => RangeSet::empty(),
            },
            RelationOp::Le => RangeSet::range(i64::MIN, self.max()),
            RelationOp::Gt => match self.min().checked_add(1) {
                Some(lo) => RangeSet::range(lo, i64::MAX),
                None => RangeSet::empty(),
            },
            RelationOp::Ge => RangeSet::range(self.min(), i64::MAX),
        }
    }

    /// Absolute values of this set under the wraparound of `width`.
    ///
    /// The minimum of the domain has no positive counterpart:
    /// `abs(i32::MIN) == i32::MIN` for `int` and `abs(i64::MIN) == i64::MIN`
    /// for `long`, so it maps to itself.
    pub fn abs(&self, width: Width) -> RangeSet {
        let min_value = width.min_value();
        let mut parts = Vec::with_capacity(self.ranges.len() + 1);
        for r in &self.ranges {
            if r.contains(min_value) {
                parts.push(Range::point(min_value));
                if r.lo < min_value {
                    parts.push(Range::new(r.lo, min_value - 1).abs());
                }
                if min_value < r.hi {
                    parts.push(Range::new(min_value + 1, r.hi).abs());
                }
            } else {
                parts.push(r.abs());
            }
        }
        Self::normalize(parts)
    }
}

impl MyHash for RangeSet {
    fn hash(&self) -> u64 {
        self.ranges.iter().fold(self.ranges.len() as u64, |h, r| {
            pairing2(h, pairing2(r.lo as u64, r.hi as u64))
        })
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", r)?;
        }
        write!(f, "}}")
    }
}
