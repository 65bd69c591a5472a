use std::fmt::Display;

use chrono::{DateTime, Duration, TimeZone};

/// Подпись для отсутствующей даты.
pub const UNKNOWN_DATE: &str = "Unknown date";

/// Дата публикации относительно `now`: «Today at 3:05 PM», «Yesterday»,
/// день недели в пределах последних семи дней, иначе полная дата.
pub fn format_relative<Tz>(date: Option<&DateTime<Tz>>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(date) = date else {
        return UNKNOWN_DATE.to_string();
    };

    let day = date.date_naive();
    let today = now.date_naive();
    if day == today {
        return format!("Today at {}", date.format("%-I:%M %p"));
    }
    if today.pred_opt() == Some(day) {
        return "Yesterday".to_string();
    }
    if *date > now.clone() - Duration::days(7) {
        return date.format("%A").to_string();
    }
    date.format("%B %-d, %Y").to_string()
}

/// Короткая метка для комментариев, например «Mar 5, 02:30 PM».
pub fn format_short<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.format("%b %-d, %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn missing_date_is_unknown() {
        assert_eq!(format_relative::<Utc>(None, &at(14, 15, 5)), UNKNOWN_DATE);
    }

    #[test]
    fn same_day_shows_time() {
        let now = at(14, 15, 5);
        assert_eq!(format_relative(Some(&at(14, 9, 7)), &now), "Today at 9:07 AM");
        assert_eq!(format_relative(Some(&at(14, 0, 30)), &now), "Today at 12:30 AM");
    }

    #[test]
    fn previous_day_is_yesterday() {
        let now = at(14, 15, 5);
        assert_eq!(format_relative(Some(&at(13, 23, 0)), &now), "Yesterday");
    }

    #[test]
    fn last_week_shows_weekday() {
        let now = at(14, 15, 5);
        assert_eq!(format_relative(Some(&at(10, 8, 0)), &now), "Monday");
    }

    #[test]
    fn older_dates_show_full_date() {
        let now = at(14, 15, 5);
        assert_eq!(format_relative(Some(&at(1, 8, 0)), &now), "March 1, 2025");
        assert_eq!(format_relative(Some(&at(7, 15, 5)), &now), "March 7, 2025");
    }

    #[test]
    fn day_boundaries_follow_the_given_zone() {
        let zone = FixedOffset::east_opt(3 * 3600).expect("valid offset");
        let now = at(14, 22, 0).with_timezone(&zone);
        let date = at(14, 20, 30).with_timezone(&zone);
        assert_eq!(format_relative(Some(&date), &now), "Yesterday");
    }

    #[test]
    fn short_format_has_month_and_time() {
        assert_eq!(format_short(&at(5, 14, 30)), "Mar 5, 02:30 PM");
    }
}
