// src/window.rs
//! Turns a run window into per-month fetch units.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use tracing::warn;

use crate::config::{ConfigError, DEFAULT_VARIANT};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of months covered by a `(start, end)` date window.
///
/// Both bounds are truncated to their month, so an `end` that falls on the
/// first of a month still pulls in that whole month. The window is `Copy`
/// and every traversal yields the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    first: YearMonth,
    last: YearMonth,
}

impl MonthWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvertedWindow { start, end });
        }
        Ok(MonthWindow {
            first: YearMonth::of(start),
            last: YearMonth::of(end),
        })
    }

    pub fn first(&self) -> YearMonth {
        self.first
    }

    pub fn last(&self) -> YearMonth {
        self.last
    }

    pub fn iter(&self) -> MonthIter {
        MonthIter {
            next: Some(self.first),
            last: self.last,
        }
    }

    /// Number of months in the window (always at least one).
    pub fn len(&self) -> usize {
        let months = |ym: YearMonth| ym.year as i64 * 12 + ym.month as i64;
        (months(self.last) - months(self.first) + 1) as usize
    }
}

impl IntoIterator for MonthWindow {
    type Item = YearMonth;
    type IntoIter = MonthIter;

    fn into_iter(self) -> MonthIter {
        self.iter()
    }
}

impl IntoIterator for &MonthWindow {
    type Item = YearMonth;
    type IntoIter = MonthIter;

    fn into_iter(self) -> MonthIter {
        self.iter()
    }
}

/// Lazy month-by-month walk of a [`MonthWindow`].
#[derive(Debug, Clone)]
pub struct MonthIter {
    next: Option<YearMonth>,
    last: YearMonth,
}

impl Iterator for MonthIter {
    type Item = YearMonth;

    fn next(&mut self) -> Option<YearMonth> {
        let current = self.next?;
        self.next = if current < self.last {
            Some(current.next())
        } else {
            None
        };
        Some(current)
    }
}

/// One (variant, year, month) combination, fetched as a single remote file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchUnit {
    pub variant: String,
    pub year: i32,
    pub month: u32,
}

impl FetchUnit {
    pub fn new(variant: impl Into<String>, ym: YearMonth) -> Self {
        FetchUnit {
            variant: variant.into(),
            year: ym.year,
            month: ym.month,
        }
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

impl fmt::Display for FetchUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.variant, self.year_month())
    }
}

/// A variant becomes part of a file name, so it must not carry path or URL
/// syntax.
fn is_valid_variant(v: &str) -> bool {
    !v.contains("..")
        && !v
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '?' | '#' | '%'))
}

/// Blank names are dropped, names carrying path or URL syntax are dropped
/// with a warning, duplicates keep their first position, and an empty result
/// falls back to [`DEFAULT_VARIANT`].
pub fn normalize_variants(variants: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(variants.len());
    for v in variants {
        let v = v.trim();
        if v.is_empty() || out.iter().any(|seen| seen == v) {
            continue;
        }
        if !is_valid_variant(v) {
            warn!(variant = v, "ignoring invalid variant name");
            continue;
        }
        out.push(v.to_string());
    }
    if out.is_empty() {
        out.push(DEFAULT_VARIANT.to_string());
    }
    out
}

/// Cross every variant with every month of `window`.
///
/// Variant-major: all months of the first variant, in window order, then the
/// next variant.
pub fn plan_fetch_units(window: &MonthWindow, variants: &[String]) -> Vec<FetchUnit> {
    let variants = normalize_variants(variants);
    let mut units = Vec::with_capacity(variants.len() * window.len());
    for variant in &variants {
        units.extend(window.iter().map(|ym| FetchUnit::new(variant.as_str(), ym)));
    }
    units
}
