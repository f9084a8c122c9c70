//! Configuration types for the scheduling system.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Date format used for holiday keys (`YYYY-MM-DD`).
pub const HOLIDAY_FORMAT: &str = "%Y-%m-%d";

/// Errors raised for a calendar configuration that cannot be scheduled against.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("workdayStartHour must be in 0..=23, got {0}")]
    InvalidStartHour(u32),
    #[error("workdayLengthHours must be positive")]
    EmptyWorkday,
    #[error("workday ends past midnight: start {start} + length {length} > 24")]
    WorkdayPastMidnight { start: u32, length: u32 },
    #[error("offWeekdays entry {0} is not a weekday number (0=Sunday..6=Saturday)")]
    InvalidWeekday(u8),
    #[error("every weekday is marked off; no working day can ever be found")]
    NoWorkingDays,
    #[error("holiday {0:?} is not a YYYY-MM-DD date")]
    InvalidHoliday(String),
    #[error("utcOffsetMinutes {0} is outside -1439..=1439")]
    InvalidUtcOffset(i32),
}

fn default_start_hour() -> u32 {
    8
}

fn default_length_hours() -> u32 {
    8
}

fn default_off_weekdays() -> Vec<u8> {
    vec![0, 6]
}

/// Working calendar configuration, as persisted under `scheduleConfig`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    /// Hour of day (local) at which the workday window opens.
    #[serde(default = "default_start_hour")]
    pub workday_start_hour: u32,
    /// Length of the workday window in hours.
    #[serde(default = "default_length_hours")]
    pub workday_length_hours: u32,
    /// Weekday numbers that never work (0=Sunday..6=Saturday).
    /// Absent in the document means Saturday/Sunday; an empty list means
    /// every weekday is a working day.
    #[serde(default = "default_off_weekdays")]
    pub off_weekdays: Vec<u8>,
    /// Non-working calendar dates, `YYYY-MM-DD`.
    #[serde(default)]
    pub holidays: Vec<String>,
    /// Fixed offset of the shop's local calendar from UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Store settings the scheduler does not read (`mode`,
    /// `autoAssignEmployees`, `allowOvertime`, ...), written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            workday_start_hour: default_start_hour(),
            workday_length_hours: default_length_hours(),
            off_weekdays: default_off_weekdays(),
            holidays: Vec::new(),
            utc_offset_minutes: 0,
            extra: Map::new(),
        }
    }
}

impl ScheduleConfig {
    /// Hour at which the workday window closes (exclusive).
    pub fn workday_end_hour(&self) -> u32 {
        self.workday_start_hour + self.workday_length_hours
    }

    pub fn with_workday(mut self, start_hour: u32, length_hours: u32) -> Self {
        self.workday_start_hour = start_hour;
        self.workday_length_hours = length_hours;
        self
    }

    pub fn with_off_weekdays(mut self, off_weekdays: impl Into<Vec<u8>>) -> Self {
        self.off_weekdays = off_weekdays.into();
        self
    }

    pub fn with_holidays<I, S>(mut self, holidays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.holidays = holidays.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Parse the holiday list into dates.
    pub fn holiday_dates(&self) -> Result<Vec<NaiveDate>, ConfigError> {
        self.holidays
            .iter()
            .map(|h| {
                NaiveDate::parse_from_str(h.trim(), HOLIDAY_FORMAT)
                    .map_err(|_| ConfigError::InvalidHoliday(h.clone()))
            })
            .collect()
    }

    /// Reject configurations the calendar cannot work with.
    ///
    /// An all-days-off week would make the next-working-day search spin
    /// forever, so it is refused here rather than guarded in the loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workday_start_hour > 23 {
            return Err(ConfigError::InvalidStartHour(self.workday_start_hour));
        }
        if self.workday_length_hours == 0 {
            return Err(ConfigError::EmptyWorkday);
        }
        if self.workday_end_hour() > 24 {
            return Err(ConfigError::WorkdayPastMidnight {
                start: self.workday_start_hour,
                length: self.workday_length_hours,
            });
        }
        if let Some(&bad) = self.off_weekdays.iter().find(|&&wd| wd > 6) {
            return Err(ConfigError::InvalidWeekday(bad));
        }
        if (0..7u8).all(|wd| self.off_weekdays.contains(&wd)) {
            return Err(ConfigError::NoWorkingDays);
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidUtcOffset(self.utc_offset_minutes));
        }
        self.holiday_dates()?;
        Ok(())
    }
}

/// Options for one orchestrator invocation.
#[derive(Clone, Debug, Default)]
pub struct ScheduleOptions {
    /// Discard existing timestamps in scope and recompute them.
    pub force: bool,
    /// Restrict the run to the tasks of a single order.
    pub only_order_id: Option<String>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl ScheduleOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    pub fn for_order(mut self, order_id: impl Into<String>) -> Self {
        self.only_order_id = Some(order_id.into());
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}
