//! Seasonal rate quoting.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::constants::HIGH_SEASON_MONTHS;

/// Price breakdown for a rental period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Quote {
    pub days: i64,
    pub high_season_days: i64,
    pub total: i64,
}

/// Billable days: started 24h periods, at least one.
pub fn rental_days(pickup_at: DateTime<Utc>, return_at: DateTime<Utc>) -> i64 {
    let seconds = (return_at - pickup_at).num_seconds().abs();
    let days = (seconds + 86_399) / 86_400;
    days.max(1)
}

/// Quote a rental: each day is billed at the high rate when it falls in
/// a high-season month, at the low rate otherwise.
pub fn quote(
    rate_low: i64,
    rate_high: i64,
    pickup_at: DateTime<Utc>,
    return_at: DateTime<Utc>,
) -> Quote {
    let days = rental_days(pickup_at, return_at);
    let start = pickup_at.min(return_at);

    let high_season_days = (0..days)
        .filter(|offset| {
            let day = start + Duration::days(*offset);
            HIGH_SEASON_MONTHS.contains(&day.month())
        })
        .count() as i64;

    Quote {
        days,
        high_season_days,
        total: high_season_days * rate_high + (days - high_season_days) * rate_low,
    }
}
