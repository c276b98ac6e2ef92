use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::PropdeskError;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, PropdeskError> {
        if !(1..=12).contains(&month) {
            return Err(PropdeskError::DateError(format!("month {month} out of range")));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// `day` of this month, clamped to the month's last day.
    pub fn day_clamped(&self, day: u32) -> Result<NaiveDate, PropdeskError> {
        (1..=day.min(31))
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(self.year, self.month, d))
            .ok_or_else(|| PropdeskError::DateError(format!("no day {day} in {self}")))
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = PropdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || PropdeskError::DateError(format!("'{s}' is not a YYYY-MM billing period"));
        let (y, m) = s.trim().split_once('-').ok_or_else(bad)?;
        let year: i32 = y.parse().map_err(|_| bad())?;
        let month: u32 = m.parse().map_err(|_| bad())?;
        Self::new(year, month).map_err(|_| bad())
    }
}

impl Serialize for BillingPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BillingPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let p: BillingPeriod = "2025-07".parse().unwrap();
        assert_eq!(p.year(), 2025);
        assert_eq!(p.month(), 7);
        assert_eq!(p.to_string(), "2025-07");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("2025-13".parse::<BillingPeriod>().is_err());
        assert!("July 2025".parse::<BillingPeriod>().is_err());
    }

    #[test]
    fn test_day_clamped_to_month_end() {
        let feb: BillingPeriod = "2025-02".parse().unwrap();
        assert_eq!(feb.day_clamped(31).unwrap(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        let leap: BillingPeriod = "2024-02".parse().unwrap();
        assert_eq!(leap.day_clamped(30).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
