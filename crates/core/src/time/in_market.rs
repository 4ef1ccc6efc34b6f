use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

// IST is UTC+05:30.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

const PRE_MARKET_START_MIN: u32 = 9 * 60;
const MARKET_OPEN_MIN: u32 = 9 * 60 + 15;
const MARKET_CLOSE_MIN: u32 = 15 * 60 + 30;
const POST_MARKET_END_MIN: u32 = 16 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketSession {
    PreMarket,
    Open,
    PostMarket,
    Closed,
}

impl fmt::Display for MarketSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketSession::PreMarket => "PRE_MARKET",
            MarketSession::Open => "OPEN",
            MarketSession::PostMarket => "POST_MARKET",
            MarketSession::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// Wall-clock time in IST for `now_utc`.
pub fn to_ist(now_utc: DateTime<Utc>) -> NaiveDateTime {
    (now_utc + Duration::seconds(i64::from(IST_OFFSET_SECS))).naive_utc()
}

pub fn market_session(now_utc: DateTime<Utc>) -> MarketSession {
    let now_ist = to_ist(now_utc);
    let date = now_ist.date();
    if is_weekend(date) || configured_holidays().contains(&date) {
        return MarketSession::Closed;
    }

    let minutes = now_ist.hour() * 60 + now_ist.minute();
    if (PRE_MARKET_START_MIN..MARKET_OPEN_MIN).contains(&minutes) {
        MarketSession::PreMarket
    } else if (MARKET_OPEN_MIN..MARKET_CLOSE_MIN).contains(&minutes) {
        MarketSession::Open
    } else if (MARKET_CLOSE_MIN..POST_MARKET_END_MIN).contains(&minutes) {
        MarketSession::PostMarket
    } else {
        MarketSession::Closed
    }
}

/// Human-readable age of `published` relative to `now`. Future timestamps read as "Just now".
pub fn time_ago(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(published);
    if elapsed < Duration::minutes(1) {
        return "Just now".to_string();
    }
    if elapsed < Duration::hours(1) {
        return plural(elapsed.num_minutes(), "minute");
    }
    if elapsed < Duration::days(1) {
        return plural(elapsed.num_hours(), "hour");
    }
    plural(elapsed.num_days(), "day")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().number_from_monday() >= 6
}

// Fixed-date exchange holidays plus any listed in NSE_MARKET_HOLIDAYS="YYYY-MM-DD,...".
// Moving festival holidays (Diwali, Holi) must come from the env list.
fn configured_holidays() -> HashSet<NaiveDate> {
    const FIXED: [(u32, u32); 4] = [(1, 26), (8, 15), (10, 2), (12, 25)];

    let fixed = (2024..=2030)
        .flat_map(|y| FIXED.iter().map(move |&(m, d)| (y, m, d)))
        .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));

    let extra = std::env::var("NSE_MARKET_HOLIDAYS").unwrap_or_default();
    let listed = extra
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    fixed.chain(listed).collect()
}
