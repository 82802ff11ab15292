//! Historical reconstructor.
//!
//! Re-runs the engine as of a past date using only evidence recorded at or
//! before the end of that day and press published by then. News decays
//! relative to the reference date, not today.
//!
//! ## Invariants
//! - Read-only: the store is only queried through its immutable API
//! - Idempotent: the same date, version and weights give the same digest
//! - Entities with no admissible evidence are excluded, not scored on defaults

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use toolrank_models::{Entity, ExcludedEntity, PressItem, RankingSnapshot};
use toolrank_store::{EvidenceStore, PressSource};

use crate::engine::{Engine, RankRequest};
use crate::error::EngineError;

/// Last second of a calendar day, UTC.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
    date.and_time(last_second).and_utc()
}

/// A calendar month, `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::InvalidPeriod(format!("{}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
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

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    /// Reference time for the month: 23:59:59 UTC on its last day.
    pub fn end(&self) -> DateTime<Utc> {
        end_of_day(self.last_day())
    }

    /// Inclusive range of months; `from` must not be after `to`.
    pub fn range(from: MonthPeriod, to: MonthPeriod) -> Result<Vec<MonthPeriod>, EngineError> {
        if from > to {
            return Err(EngineError::InvalidPeriod(format!(
                "range start {} is after end {}",
                from, to
            )));
        }
        let mut months = vec![from];
        let mut current = from;
        while current < to {
            current = current.next();
            months.push(current);
        }
        Ok(months)
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthPeriod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

/// Reconstructs rankings as they would have been computed on past dates.
pub struct HistoricalReconstructor<'a> {
    engine: &'a Engine,
    store: &'a dyn EvidenceStore,
    press: &'a dyn PressSource,
}

impl<'a> HistoricalReconstructor<'a> {
    pub fn new(engine: &'a Engine, store: &'a dyn EvidenceStore, press: &'a dyn PressSource) -> Self {
        Self {
            engine,
            store,
            press,
        }
    }

    /// Snapshot for `period` as of the end of `date`.
    pub fn reconstruct_at(
        &self,
        period: &str,
        date: NaiveDate,
    ) -> Result<RankingSnapshot, EngineError> {
        self.reconstruct_linked(period, date, None)
    }

    /// Like [`reconstruct_at`](Self::reconstruct_at), recording movement
    /// against a prior snapshot.
    pub fn reconstruct_linked(
        &self,
        period: &str,
        date: NaiveDate,
        previous: Option<&RankingSnapshot>,
    ) -> Result<RankingSnapshot, EngineError> {
        let press = self.press.press_items(None)?;
        let reference = end_of_day(date);
        let (entities, excluded) = self.admissible_entities(reference)?;
        let request = RankRequest::historical(period, reference).with_previous(previous);
        Ok(self.engine.rank(&entities, &press, excluded, &request))
    }

    /// Snapshot for one month, as of its last day.
    pub fn reconstruct_month(&self, month: MonthPeriod) -> Result<RankingSnapshot, EngineError> {
        let press = self.press.press_items(None)?;
        self.reconstruct_with(&month.to_string(), month.end(), &press)
    }

    /// One snapshot per month in `[from, to]`, in chronological order.
    ///
    /// Months run concurrently on the engine's pool.
    pub fn backtest_months(
        &self,
        from: MonthPeriod,
        to: MonthPeriod,
    ) -> Result<Vec<RankingSnapshot>, EngineError> {
        let months = MonthPeriod::range(from, to)?;
        let press = self.press.press_items(None)?;
        info!(
            from = %from,
            to = %to,
            months = months.len(),
            version = %self.engine.version(),
            "backtest started"
        );
        let snapshots = self.engine.install(|| {
            months
                .par_iter()
                .map(|m| self.reconstruct_with(&m.to_string(), m.end(), &press))
                .collect::<Result<Vec<_>, _>>()
        })?;
        info!(snapshots = snapshots.len(), "backtest complete");
        Ok(snapshots)
    }

    fn reconstruct_with(
        &self,
        period: &str,
        reference: DateTime<Utc>,
        press: &[PressItem],
    ) -> Result<RankingSnapshot, EngineError> {
        let (entities, excluded) = self.admissible_entities(reference)?;
        let request = RankRequest::historical(period, reference);
        Ok(self.engine.rank(&entities, press, excluded, &request))
    }

    fn admissible_entities(
        &self,
        reference: DateTime<Utc>,
    ) -> Result<(Vec<Entity>, Vec<ExcludedEntity>), EngineError> {
        let mut entities = Vec::new();
        let mut excluded = Vec::new();
        for id in self.store.entity_ids()? {
            match self.store.evidence_as_of(&id, reference)? {
                Some(entity) => entities.push(entity),
                None => excluded.push(ExcludedEntity {
                    entity_id: id,
                    reason: format!(
                        "no evidence recorded on or before {}",
                        reference.date_naive()
                    ),
                }),
            }
        }
        Ok((entities, excluded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_parse_and_end() {
        let feb: MonthPeriod = "2024-02".parse().unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb.end().to_rfc3339(), "2024-02-29T23:59:59+00:00");
        assert_eq!(feb.to_string(), "2024-02");
        assert!("2024-13".parse::<MonthPeriod>().is_err());
        assert!("2024-2".parse::<MonthPeriod>().is_err());
        assert!("Feb 2024".parse::<MonthPeriod>().is_err());
    }

    #[test]
    fn test_range_crosses_year() {
        let from: MonthPeriod = "2024-11".parse().unwrap();
        let to: MonthPeriod = "2025-02".parse().unwrap();
        let months: Vec<String> = MonthPeriod::range(from, to)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(months, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);
        assert!(MonthPeriod::range(to, from).is_err());
    }

    #[test]
    fn test_december_end() {
        let dec = MonthPeriod::new(2024, 12).unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }
}
