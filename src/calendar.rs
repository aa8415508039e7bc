//! Jalali (Iranian) calendar conversion and shop-local time.
//!
//! The workshop operates in Asia/Tehran and exchanges calendar dates in the
//! Jalali `YYYY/MM/DD` form; storage is canonical Gregorian. The conversion
//! uses the 33-year-cycle break-list algorithm.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Asia::Tehran;

/// Jalali years at which the leap-year cycle pattern changes.
const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// Time provider for all workflow business logic. Production code uses
/// [`TehranClock`]; tests supply a [`FixedClock`] for deterministic output.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in the shop's local time zone.
    fn now_local(&self) -> NaiveDateTime;
}

/// System clock localized to Asia/Tehran.
#[derive(Debug, Clone, Copy, Default)]
pub struct TehranClock;

impl Clock for TehranClock {
    fn now_local(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&Tehran).naive_local()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now_local(&self) -> NaiveDateTime {
        self.0
    }
}

/// Leap status, Gregorian year and the Gregorian March day of Farvardin 1
/// for the given Jalali year. Returns `None` outside the supported range.
fn jal_cal(jy: i32) -> Option<(i32, i32, u32)> {
    if jy < BREAKS[0] || jy >= BREAKS[BREAKS.len() - 1] {
        return None;
    }

    let gy = jy + 621;
    let mut leap_j = -14i32;
    let mut jp = BREAKS[0];
    let mut jump = 0i32;

    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + (jump % 33) / 4;
        jp = jm;
    }

    let mut n = jy - jp;
    leap_j += n / 33 * 8 + ((n % 33) + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
    let march = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    Some((leap, gy, march as u32))
}

/// Whether the given Jalali year has 366 days (Esfand with 30 days).
pub fn is_leap_jalali_year(jy: i32) -> bool {
    matches!(jal_cal(jy), Some((0, _, _)))
}

fn jalali_month_len(jy: i32, jm: u32) -> u32 {
    match jm {
        1..=6 => 31,
        7..=11 => 30,
        12 if is_leap_jalali_year(jy) => 30,
        12 => 29,
        _ => 0,
    }
}

/// Converts a Jalali calendar date to its canonical Gregorian form.
pub fn jalali_to_gregorian(jy: i32, jm: u32, jd: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&jm) || jd < 1 || jd > jalali_month_len(jy, jm) {
        return None;
    }
    let (_, gy, march) = jal_cal(jy)?;
    let farvardin_first =
        NaiveDate::from_ymd_opt(gy, 3, 1)? + Duration::days(i64::from(march) - 1);
    let offset = if jm <= 7 {
        (jm - 1) * 31
    } else {
        6 * 31 + (jm - 7) * 30
    } + (jd - 1);
    Some(farvardin_first + Duration::days(i64::from(offset)))
}

/// Parses a strict Jalali `YYYY/MM/DD` string into a Gregorian date.
pub fn parse_jalali_date(input: &str) -> Option<NaiveDate> {
    let mut parts = input.trim().split('/');
    let jy: i32 = parts.next()?.parse().ok()?;
    let jm: u32 = parts.next()?.parse().ok()?;
    let jd: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    jalali_to_gregorian(jy, jm, jd)
}

/// Projects an arrival date: order timestamp plus a whole-day offset in the
/// shop's local calendar.
pub fn project_arrival(order_date: NaiveDateTime, days: i32) -> NaiveDateTime {
    order_date + Duration::days(i64::from(days))
}
