// =============================================================================
// Holiday calendars
// =============================================================================
//
// Expands configured holidays and the built-in US federal calendar into a map
// of holiday name => affected dates (window offsets included). Weekend
// holidays also mark their observed weekday.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::runtime_config::HolidaySpec;

/// US federal holidays for `year`, as `(name, date)`.
pub fn us_federal_holidays(year: i32) -> Vec<(&'static str, NaiveDate)> {
    let mut out = Vec::new();
    let fixed = |m: u32, d: u32| NaiveDate::from_ymd_opt(year, m, d);
    let nth = |m: u32, wd: Weekday, n: u8| NaiveDate::from_weekday_of_month_opt(year, m, wd, n);

    let mut push = |name: &'static str, date: Option<NaiveDate>| {
        if let Some(d) = date {
            out.push((name, d));
        }
    };

    push("New Year's Day", fixed(1, 1));
    push("Martin Luther King Jr. Day", nth(1, Weekday::Mon, 3));
    push("Washington's Birthday", nth(2, Weekday::Mon, 3));
    push("Memorial Day", last_weekday_of_month(year, 5, Weekday::Mon));
    if year >= 2021 {
        push("Juneteenth National Independence Day", fixed(6, 19));
    }
    push("Independence Day", fixed(7, 4));
    push("Labor Day", nth(9, Weekday::Mon, 1));
    push("Columbus Day", nth(10, Weekday::Mon, 2));
    push("Veterans Day", fixed(11, 11));
    push("Thanksgiving", nth(11, Weekday::Thu, 4));
    push("Christmas Day", fixed(12, 25));

    out
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, 5)
        .or_else(|| NaiveDate::from_weekday_of_month_opt(year, month, weekday, 4))
}

/// Weekday on which a weekend holiday is observed.
fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date - Duration::days(1)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => None,
    }
}

/// Expand holidays over `[first_year, last_year]`.
///
/// `country` selects a built-in calendar ("US", case-insensitive); unknown
/// codes are reported back as `Err` so the caller can reject the settings.
pub fn holiday_dates(
    country: Option<&str>,
    custom: &[HolidaySpec],
    first_year: i32,
    last_year: i32,
) -> Result<BTreeMap<String, BTreeSet<NaiveDate>>, String> {
    let mut map: BTreeMap<String, BTreeSet<NaiveDate>> = BTreeMap::new();

    if let Some(code) = country {
        if !code.eq_ignore_ascii_case("US") {
            return Err(format!("unsupported holiday calendar '{code}'"));
        }
        for year in first_year..=last_year {
            for (name, date) in us_federal_holidays(year) {
                let entry = map.entry(name.to_string()).or_default();
                entry.insert(date);
                if let Some(obs) = observed(date) {
                    entry.insert(obs);
                }
            }
        }
    }

    for spec in custom {
        let lower = spec.lower_window.min(0);
        let upper = spec.upper_window.max(0);
        let entry = map.entry(spec.name.clone()).or_default();
        for offset in lower..=upper {
            entry.insert(spec.date + Duration::days(offset));
        }
    }

    Ok(map)
}
