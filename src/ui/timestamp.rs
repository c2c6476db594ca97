use jiff::{tz::TimeZone, Timestamp};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Compact relative time: `now`, `42s`, `5m`, `3h`, `2d`, then a calendar
/// date once older than a week. Future timestamps read as `now`.
pub fn relative(timestamp: Timestamp, now: Timestamp, tz: &TimeZone) -> String {
    let delta = now.as_second() - timestamp.as_second();

    if delta < 10 {
        "now".to_string()
    } else if delta < MINUTE {
        format!("{}s", delta)
    } else if delta < HOUR {
        format!("{}m", delta / MINUTE)
    } else if delta < DAY {
        format!("{}h", delta / HOUR)
    } else if delta < 7 * DAY {
        format!("{}d", delta / DAY)
    } else {
        let then = timestamp.to_zoned(tz.clone());
        let date = format!("{} {}", then.strftime("%b"), then.day());
        if then.year() == now.to_zoned(tz.clone()).year() {
            date
        } else {
            format!("{}, {}", date, then.year())
        }
    }
}
