//! Working calendar: workday window, off weekdays and holidays.
//!
//! Timestamps are milliseconds since the Unix epoch. Date and hour questions
//! are answered in the shop's local time, a fixed offset from UTC taken from
//! the configuration.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::config::{ConfigError, ScheduleConfig};

/// Errors from timestamp arithmetic outside chrono's representable range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("timestamp {0}ms is outside the representable date range")]
    TimestampOutOfRange(i64),
    #[error("date arithmetic overflowed past {0}")]
    DateOutOfRange(NaiveDate),
}

/// Validated, lookup-ready form of a [`ScheduleConfig`].
#[derive(Clone, Debug)]
pub struct WorkCalendar {
    start_hour: u32,
    end_hour: u32,
    /// Indexed by weekday number, 0=Sunday.
    off_weekdays: [bool; 7],
    holidays: FxHashSet<NaiveDate>,
    offset_ms: i64,
}

impl WorkCalendar {
    /// Build a calendar, rejecting configurations that cannot terminate.
    pub fn new(config: &ScheduleConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut off_weekdays = [false; 7];
        for &wd in &config.off_weekdays {
            off_weekdays[wd as usize] = true;
        }

        Ok(Self {
            start_hour: config.workday_start_hour,
            end_hour: config.workday_end_hour(),
            off_weekdays,
            holidays: config.holiday_dates()?.into_iter().collect(),
            offset_ms: i64::from(config.utc_offset_minutes) * 60_000,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Whether the date is a listed holiday, regardless of weekday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Whether task time may be consumed on this date.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().num_days_from_sunday() as usize;
        !self.off_weekdays[weekday] && !self.is_holiday(date)
    }

    /// Move forward a day at a time until a working day is reached.
    ///
    /// Returns the input unchanged if it already lies on a working day;
    /// otherwise the first working day at the workday start hour.
    pub fn next_working_day(&self, timestamp_ms: i64) -> Result<i64, CalendarError> {
        let local = self.to_local(timestamp_ms)?;
        let aligned = self.next_working_day_local(local)?;
        Ok(self.to_timestamp(aligned))
    }

    /// Snap a timestamp into the next open workday window (or leave it where
    /// it is when it already is inside one).
    pub fn align_to_workday(&self, timestamp_ms: i64) -> Result<i64, CalendarError> {
        let local = self.to_local(timestamp_ms)?;
        let aligned = self.align_local(local)?;
        Ok(self.to_timestamp(aligned))
    }

    /// End of the workday window on the timestamp's calendar day.
    pub fn end_of_workday(&self, timestamp_ms: i64) -> Result<i64, CalendarError> {
        let local = self.to_local(timestamp_ms)?;
        let end = self.at_hour(local.date(), self.end_hour)?;
        Ok(self.to_timestamp(end))
    }

    /// Workday start on the first working day strictly after the
    /// timestamp's calendar day.
    pub fn start_of_next_working_day(&self, timestamp_ms: i64) -> Result<i64, CalendarError> {
        let local = self.to_local(timestamp_ms)?;
        let next = self.at_hour(next_date(local.date())?, self.start_hour)?;
        let next = self.next_working_day_local(next)?;
        Ok(self.to_timestamp(next))
    }

    /// Local calendar date of a timestamp.
    pub fn local_date(&self, timestamp_ms: i64) -> Result<NaiveDate, CalendarError> {
        Ok(self.to_local(timestamp_ms)?.date())
    }

    fn next_working_day_local(
        &self,
        mut local: NaiveDateTime,
    ) -> Result<NaiveDateTime, CalendarError> {
        // Terminates: validation guarantees at least one working weekday and
        // the holiday set is finite.
        while !self.is_working_day(local.date()) {
            local = self.at_hour(next_date(local.date())?, self.start_hour)?;
        }
        Ok(local)
    }

    fn align_local(&self, mut local: NaiveDateTime) -> Result<NaiveDateTime, CalendarError> {
        if local.hour() < self.start_hour {
            local = self.at_hour(local.date(), self.start_hour)?;
        }
        if local.hour() >= self.end_hour {
            local = self.at_hour(next_date(local.date())?, self.start_hour)?;
        }
        self.next_working_day_local(local)
    }

    fn at_hour(&self, date: NaiveDate, hour: u32) -> Result<NaiveDateTime, CalendarError> {
        date.and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::hours(i64::from(hour)))
            .ok_or(CalendarError::DateOutOfRange(date))
    }

    fn to_local(&self, timestamp_ms: i64) -> Result<NaiveDateTime, CalendarError> {
        timestamp_ms
            .checked_add(self.offset_ms)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc())
            .ok_or(CalendarError::TimestampOutOfRange(timestamp_ms))
    }

    fn to_timestamp(&self, local: NaiveDateTime) -> i64 {
        local.and_utc().timestamp_millis() - self.offset_ms
    }
}

fn next_date(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    date.succ_opt().ok_or(CalendarError::DateOutOfRange(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
        d(year, month, day)
            .and_hms_opt(hour, minute, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    fn weekend_calendar() -> WorkCalendar {
        WorkCalendar::new(&ScheduleConfig::default()).unwrap()
    }

    #[test]
    fn test_weekend_is_not_working() {
        let cal = weekend_calendar();
        assert!(!cal.is_working_day(d(2025, 10, 4))); // Saturday
        assert!(!cal.is_working_day(d(2025, 10, 5))); // Sunday
        assert!(cal.is_working_day(d(2025, 10, 6))); // Monday
    }

    #[test]
    fn test_empty_off_weekdays_means_every_day_works() {
        let cal = WorkCalendar::new(&ScheduleConfig::default().with_off_weekdays(vec![])).unwrap();
        assert!(cal.is_working_day(d(2025, 10, 4)));
        assert!(cal.is_working_day(d(2025, 10, 5)));
    }

    #[test]
    fn test_holiday_independent_of_weekday() {
        let config = ScheduleConfig::default()
            .with_off_weekdays(vec![])
            .with_holidays(["2025-10-05", "2025-10-08"]);
        let cal = WorkCalendar::new(&config).unwrap();
        assert!(cal.is_holiday(d(2025, 10, 5)));
        assert!(cal.is_holiday(d(2025, 10, 8)));
        assert!(!cal.is_working_day(d(2025, 10, 8))); // Wednesday
        assert!(cal.is_working_day(d(2025, 10, 7)));
    }

    #[test]
    fn test_all_days_off_refused() {
        let config = ScheduleConfig::default().with_off_weekdays(vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(matches!(
            WorkCalendar::new(&config),
            Err(ConfigError::NoWorkingDays)
        ));
    }

    #[test]
    fn test_align_before_start_snaps_to_start() {
        let cal = weekend_calendar();
        assert_eq!(
            cal.align_to_workday(at(2025, 10, 6, 6, 30)).unwrap(),
            at(2025, 10, 6, 8, 0)
        );
    }

    #[test]
    fn test_align_inside_window_unchanged() {
        let cal = weekend_calendar();
        let ts = at(2025, 10, 6, 11, 17);
        assert_eq!(cal.align_to_workday(ts).unwrap(), ts);
    }

    #[test]
    fn test_align_after_end_moves_to_next_day() {
        let cal = weekend_calendar();
        assert_eq!(
            cal.align_to_workday(at(2025, 10, 6, 16, 0)).unwrap(),
            at(2025, 10, 7, 8, 0)
        );
    }

    #[test]
    fn test_align_friday_evening_skips_weekend() {
        let cal = weekend_calendar();
        assert_eq!(
            cal.align_to_workday(at(2025, 10, 10, 18, 0)).unwrap(),
            at(2025, 10, 13, 8, 0)
        );
    }

    #[test]
    fn test_align_sunday_morning() {
        let cal = weekend_calendar();
        assert_eq!(
            cal.align_to_workday(at(2025, 10, 5, 7, 0)).unwrap(),
            at(2025, 10, 6, 8, 0)
        );
    }

    #[test]
    fn test_next_working_day_keeps_working_timestamp() {
        let cal = weekend_calendar();
        let ts = at(2025, 10, 7, 9, 45);
        assert_eq!(cal.next_working_day(ts).unwrap(), ts);
        // Saturday afternoon resets to the start hour on Monday
        assert_eq!(
            cal.next_working_day(at(2025, 10, 11, 14, 0)).unwrap(),
            at(2025, 10, 13, 8, 0)
        );
    }

    #[test]
    fn test_end_of_workday() {
        let cal = weekend_calendar();
        assert_eq!(
            cal.end_of_workday(at(2025, 10, 6, 9, 0)).unwrap(),
            at(2025, 10, 6, 16, 0)
        );
    }

    #[test]
    fn test_end_of_workday_at_midnight() {
        let cal = WorkCalendar::new(&ScheduleConfig::default().with_workday(16, 8)).unwrap();
        assert_eq!(
            cal.end_of_workday(at(2025, 10, 6, 17, 0)).unwrap(),
            at(2025, 10, 7, 0, 0)
        );
    }

    #[test]
    fn test_start_of_next_working_day_skips_holiday_block() {
        let config = ScheduleConfig::default()
            .with_holidays(["2025-12-24", "2025-12-25", "2025-12-26"]);
        let cal = WorkCalendar::new(&config).unwrap();
        // Tuesday 23rd -> Wed/Thu/Fri holidays, Sat/Sun off -> Monday 29th
        assert_eq!(
            cal.start_of_next_working_day(at(2025, 12, 23, 16, 0)).unwrap(),
            at(2025, 12, 29, 8, 0)
        );
    }

    #[test]
    fn test_utc_offset_shifts_local_day() {
        // UTC+2: 2025-10-06 05:30 UTC is 07:30 local, before the 08:00 start
        let config = ScheduleConfig::default().with_utc_offset_minutes(120);
        let cal = WorkCalendar::new(&config).unwrap();
        assert_eq!(
            cal.align_to_workday(at(2025, 10, 6, 5, 30)).unwrap(),
            at(2025, 10, 6, 6, 0)
        );
        // 23:00 UTC Sunday is already Monday 01:00 local
        assert_eq!(cal.local_date(at(2025, 10, 5, 23, 0)).unwrap(), d(2025, 10, 6));
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let cal = weekend_calendar();
        assert_eq!(
            cal.align_to_workday(i64::MAX),
            Err(CalendarError::TimestampOutOfRange(i64::MAX))
        );
    }
}
