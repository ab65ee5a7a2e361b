//! Validated user identifier derived from a route parameter.

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::error::InvalidUserId;

/// A strictly positive user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(NonZeroU64);

impl UserId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl FromStr for UserId {
    type Err = InvalidUserId;

    /// Accepts ASCII base-10 digits only. Leading zeros are allowed.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(InvalidUserId::Empty);
        }
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidUserId::NotANumber);
        }
        if negative || digits.bytes().all(|b| b == b'0') {
            return Err(InvalidUserId::NotPositive);
        }
        let raw: u64 = digits.parse().map_err(|_| InvalidUserId::NotANumber)?;
        UserId::new(raw).ok_or(InvalidUserId::NotPositive)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
