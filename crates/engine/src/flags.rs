//! Condition flags written by CMP/TEST and read by conditional jumps.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagFamily {
    /// equal, not_equal, above, below (CMP)
    Relational,
    /// zero, not_zero, above_zero, below_zero (TEST)
    SignTest,
}

/// Condition tested by a conditional jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Zero,
    NotZero,
    BelowZero,
    AboveZero,
    Below,
    BelowOrEqual,
    Equal,
    NotEqual,
    Above,
    AboveOrEqual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    equal: bool,
    not_equal: bool,
    above: bool,
    below: bool,
    zero: bool,
    not_zero: bool,
    above_zero: bool,
    below_zero: bool,
}

impl Flags {
    pub fn reset_family(&mut self, family: FlagFamily) {
        match family {
            FlagFamily::Relational => {
                self.equal = false;
                self.not_equal = false;
                self.above = false;
                self.below = false;
            }
            FlagFamily::SignTest => {
                self.zero = false;
                self.not_zero = false;
                self.above_zero = false;
                self.below_zero = false;
            }
        }
    }

    /// CMP: relates `a` (second from top) to `b` (top).
    pub(crate) fn compare(&mut self, a: Word, b: Word) {
        self.reset_family(FlagFamily::Relational);
        match a.cmp(&b) {
            Ordering::Less => self.below = true,
            Ordering::Equal => self.equal = true,
            Ordering::Greater => self.above = true,
        }
        self.not_equal = !self.equal;
    }

    /// TEST: classifies the sign of `a`.
    pub(crate) fn test(&mut self, a: Word) {
        self.reset_family(FlagFamily::SignTest);
        match a.cmp(&0) {
            Ordering::Less => self.below_zero = true,
            Ordering::Equal => self.zero = true,
            Ordering::Greater => self.above_zero = true,
        }
        self.not_zero = !self.zero;
    }

    pub fn holds(&self, condition: Condition) -> bool {
        match condition {
            Condition::Zero => self.zero,
            Condition::NotZero => self.not_zero,
            Condition::BelowZero => self.below_zero,
            Condition::AboveZero => self.above_zero,
            Condition::Below => self.below,
            Condition::BelowOrEqual => self.below || self.equal,
            Condition::Equal => self.equal,
            Condition::NotEqual => self.not_equal,
            Condition::Above => self.above,
            Condition::AboveOrEqual => self.above || self.equal,
        }
    }

    pub fn equal(&self) -> bool {
        self.equal
    }

    pub fn not_equal(&self) -> bool {
        self.not_equal
    }

    pub fn above(&self) -> bool {
        self.above
    }

    pub fn below(&self) -> bool {
        self.below
    }

    pub fn zero(&self) -> bool {
        self.zero
    }

    pub fn not_zero(&self) -> bool {
        self.not_zero
    }

    pub fn above_zero(&self) -> bool {
        self.above_zero
    }

    pub fn below_zero(&self) -> bool {
        self.below_zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relational(f: &Flags) -> [bool; 4] {
        [f.equal(), f.not_equal(), f.above(), f.below()]
    }

    #[test]
    fn compare_sets_exactly_one_relation() {
        let mut flags = Flags::default();
        flags.compare(5, 5);
        assert_eq!(relational(&flags), [true, false, false, false]);
        flags.compare(7, 5);
        assert_eq!(relational(&flags), [false, true, true, false]);
        flags.compare(i32::MIN, i32::MAX);
        assert_eq!(relational(&flags), [false, true, false, true]);
    }

    #[test]
    fn compare_leaves_sign_family_alone() {
        let mut flags = Flags::default();
        flags.test(-3);
        flags.compare(1, 2);
        assert!(flags.below_zero());
        assert!(flags.not_zero());
        flags.test(0);
        assert!(flags.zero() && !flags.not_zero() && !flags.below_zero());
        assert!(flags.below());
    }

    #[test]
    fn combined_conditions() {
        let mut flags = Flags::default();
        flags.compare(2, 2);
        assert!(flags.holds(Condition::BelowOrEqual));
        assert!(flags.holds(Condition::AboveOrEqual));
        assert!(!flags.holds(Condition::NotEqual));
        flags.compare(3, 2);
        assert!(!flags.holds(Condition::BelowOrEqual));
        assert!(flags.holds(Condition::AboveOrEqual));
    }

    #[test]
    fn fresh_flags_hold_nothing() {
        let flags = Flags::default();
        assert!(!flags.holds(Condition::Zero));
        assert!(!flags.holds(Condition::NotZero));
        assert!(!flags.holds(Condition::Equal));
        assert!(!flags.holds(Condition::NotEqual));
    }
}
