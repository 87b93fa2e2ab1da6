//! Calendar versioning: date-derived major/minor with period-based patch.

use crate::domain::SemVer;
use crate::error::{MonoverError, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Supported calendar schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalVerScheme {
    /// `YYYY.MM.PATCH` - full year, unpadded month
    YearMonth,
    /// `YY.0M.PATCH` - two-digit year, zero-padded month
    ShortYearZeroMonth,
    /// `YYYY.WW.PATCH` - full year, ISO week
    YearWeek,
    /// `YYYY.0M.PATCH` - full year, zero-padded month
    YearZeroMonth,
}

impl FromStr for CalVerScheme {
    type Err = MonoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "YYYY.MM.PATCH" | "YYYY.MM" => Ok(CalVerScheme::YearMonth),
            "YY.0M.PATCH" | "YY.0M" => Ok(CalVerScheme::ShortYearZeroMonth),
            "YYYY.WW.PATCH" | "YYYY.WW" => Ok(CalVerScheme::YearWeek),
            "YYYY.0M.PATCH" | "YYYY.0M" => Ok(CalVerScheme::YearZeroMonth),
            other => Err(MonoverError::config(format!(
                "Unknown CalVer scheme: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CalVerScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalVerScheme::YearMonth => write!(f, "YYYY.MM.PATCH"),
            CalVerScheme::ShortYearZeroMonth => write!(f, "YY.0M.PATCH"),
            CalVerScheme::YearWeek => write!(f, "YYYY.WW.PATCH"),
            CalVerScheme::YearZeroMonth => write!(f, "YYYY.0M.PATCH"),
        }
    }
}

impl CalVerScheme {
    /// The (major, minor) pair this scheme derives from a date.
    pub fn period(&self, date: NaiveDate) -> (u64, u64) {
        match self {
            CalVerScheme::YearMonth | CalVerScheme::YearZeroMonth => {
                (date.year() as u64, date.month() as u64)
            }
            CalVerScheme::ShortYearZeroMonth => {
                ((date.year() % 100) as u64, date.month() as u64)
            }
            // ISO week pairs with the ISO week-based year so the first days
            // of January can belong to the previous year's last week
            CalVerScheme::YearWeek => (
                date.iso_week().year() as u64,
                date.iso_week().week() as u64,
            ),
        }
    }

    fn pads_minor(&self) -> bool {
        matches!(
            self,
            CalVerScheme::ShortYearZeroMonth | CalVerScheme::YearZeroMonth
        )
    }
}

/// Computes calendar versions with period-based patch sequencing.
#[derive(Debug, Clone)]
pub struct CalVerCalculator {
    pub scheme: CalVerScheme,
    /// When true (the default), crossing a period boundary resets patch to 0;
    /// otherwise the patch keeps incrementing across periods.
    pub reset_patch_periodically: bool,
}

impl CalVerCalculator {
    pub fn new(scheme: CalVerScheme) -> Self {
        CalVerCalculator {
            scheme,
            reset_patch_periodically: true,
        }
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset_patch_periodically = reset;
        self
    }

    /// Compute the next version triple for `date`, given the previous tag's
    /// version (interpreted under this scheme) if any.
    pub fn calculate(&self, previous: Option<&SemVer>, date: NaiveDate) -> SemVer {
        let (major, minor) = self.scheme.period(date);

        let patch = match previous {
            Some(prev) if prev.major == major && prev.minor == minor => prev.patch + 1,
            Some(prev) if !self.reset_patch_periodically => prev.patch + 1,
            _ => 0,
        };

        SemVer::new(major, minor, patch)
    }

    /// Render a computed version, honoring the scheme's zero padding. This is
    /// presentation only; the underlying [SemVer] stays numeric.
    pub fn format(&self, version: &SemVer) -> String {
        let mut out = if self.scheme.pads_minor() {
            format!("{}.{:02}.{}", version.major, version.minor, version.patch)
        } else {
            format!("{}.{}.{}", version.major, version.minor, version.patch)
        };
        if !version.prerelease.is_empty() {
            out.push('-');
            out.push_str(&version.prerelease.join("."));
        }
        if let Some(ref build) = version.build {
            out.push('+');
            out.push_str(build);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!(
            "YYYY.MM.PATCH".parse::<CalVerScheme>().unwrap(),
            CalVerScheme::YearMonth
        );
        assert_eq!(
            "yy.0m.patch".parse::<CalVerScheme>().unwrap(),
            CalVerScheme::ShortYearZeroMonth
        );
        assert!("YYYY.DD".parse::<CalVerScheme>().is_err());
    }

    #[test]
    fn test_first_release_in_period() {
        let calc = CalVerCalculator::new(CalVerScheme::YearMonth);
        let v = calc.calculate(None, date(2025, 11, 5));
        assert_eq!(v, SemVer::new(2025, 11, 0));
    }

    #[test]
    fn test_same_period_increments_patch() {
        let calc = CalVerCalculator::new(CalVerScheme::YearMonth);
        let first = calc.calculate(None, date(2025, 11, 5));
        let second = calc.calculate(Some(&first), date(2025, 11, 20));
        assert_eq!(second, SemVer::new(2025, 11, 1));
    }

    #[test]
    fn test_period_boundary_resets_patch() {
        let calc = CalVerCalculator::new(CalVerScheme::YearMonth);
        let november = SemVer::new(2025, 11, 4);
        let december = calc.calculate(Some(&november), date(2025, 12, 1));
        assert_eq!(december, SemVer::new(2025, 12, 0));
    }

    #[test]
    fn test_no_reset_continues_patch() {
        let calc = CalVerCalculator::new(CalVerScheme::YearMonth).with_reset(false);
        let november = SemVer::new(2025, 11, 4);
        let december = calc.calculate(Some(&november), date(2025, 12, 1));
        assert_eq!(december, SemVer::new(2025, 12, 5));
    }

    #[test]
    fn test_short_year() {
        let calc = CalVerCalculator::new(CalVerScheme::ShortYearZeroMonth);
        let v = calc.calculate(None, date(2025, 4, 1));
        assert_eq!(v, SemVer::new(25, 4, 0));
        assert_eq!(calc.format(&v), "25.04.0");
    }

    #[test]
    fn test_zero_month_padding_in_string_only() {
        let calc = CalVerCalculator::new(CalVerScheme::YearZeroMonth);
        let v = calc.calculate(None, date(2025, 4, 1));
        assert_eq!(v, SemVer::new(2025, 4, 0));
        assert_eq!(calc.format(&v), "2025.04.0");
        // unpadded schemes render plainly
        let plain = CalVerCalculator::new(CalVerScheme::YearMonth);
        assert_eq!(plain.format(&v), "2025.4.0");
    }

    #[test]
    fn test_iso_week_scheme() {
        let calc = CalVerCalculator::new(CalVerScheme::YearWeek);
        // 2026-01-01 falls in ISO week 1 of 2026
        let v = calc.calculate(None, date(2026, 1, 1));
        assert_eq!(v, SemVer::new(2026, 1, 0));
        // 2027-01-01 falls in ISO week 53 of 2026
        let v = calc.calculate(None, date(2027, 1, 1));
        assert_eq!(v, SemVer::new(2026, 53, 0));
    }

    #[test]
    fn test_week_period_increments_within_week() {
        let calc = CalVerCalculator::new(CalVerScheme::YearWeek);
        // Monday and Friday of the same ISO week
        let monday = calc.calculate(None, date(2025, 11, 3));
        let friday = calc.calculate(Some(&monday), date(2025, 11, 7));
        assert_eq!(friday.major, monday.major);
        assert_eq!(friday.minor, monday.minor);
        assert_eq!(monday.patch, 0);
        assert_eq!(friday.patch, 1);
    }

    #[test]
    fn test_format_with_prerelease() {
        let calc = CalVerCalculator::new(CalVerScheme::YearZeroMonth);
        let v = SemVer::new(2025, 4, 1).with_prerelease("rc.2");
        assert_eq!(calc.format(&v), "2025.04.1-rc.2");
    }
}
