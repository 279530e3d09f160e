use time::{macros::format_description, PrimitiveDateTime};

const MONTH_ABBREV: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Calendar position of a reading, derived from its timestamp.
///
/// `weekday` counts from Monday = 0; Saturday and Sunday are weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarAttributes {
    pub month: u8,
    pub hour: u8,
    pub weekday: u8,
    pub is_weekend: bool,
}

/// Parse the fixed `day/month/year hour:minute` timestamp format of the
/// meter export files.
pub fn parse_timestamp(text: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    let format = format_description!("[day]/[month]/[year] [hour]:[minute]");
    PrimitiveDateTime::parse(text.trim(), &format)
}

pub fn attributes_of(ts: PrimitiveDateTime) -> CalendarAttributes {
    let weekday = ts.weekday().number_days_from_monday();
    CalendarAttributes {
        month: u8::from(ts.month()),
        hour: ts.hour(),
        weekday,
        is_weekend: weekday >= 5,
    }
}

/// Human-readable month label for report buckets.
pub fn month_abbrev(month: u8) -> &'static str {
    usize::from(month)
        .checked_sub(1)
        .and_then(|i| MONTH_ABBREV.get(i))
        .copied()
        .unwrap_or("???")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_meter_export_format() {
        let ts = parse_timestamp("15/07/2023 18:30").unwrap();
        assert_eq!(u8::from(ts.month()), 7);
        assert_eq!(ts.day(), 15);
        assert_eq!(ts.hour(), 18);
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn rejects_other_formats() {
        assert!(parse_timestamp("2023-07-15 18:30").is_err());
        assert!(parse_timestamp("15/07/2023").is_err());
        assert!(parse_timestamp("not a date").is_err());
    }

    #[test]
    fn saturday_and_sunday_are_weekend() {
        // 2023-07-14 was a Friday, the 15th a Saturday, the 16th a Sunday.
        let friday = attributes_of(parse_timestamp("14/07/2023 09:15").unwrap());
        assert_eq!(friday.weekday, 4);
        assert!(!friday.is_weekend);

        let saturday = attributes_of(parse_timestamp("15/07/2023 09:15").unwrap());
        assert_eq!(saturday.weekday, 5);
        assert!(saturday.is_weekend);

        let sunday = attributes_of(parse_timestamp("16/07/2023 09:15").unwrap());
        assert_eq!(sunday.weekday, 6);
        assert!(sunday.is_weekend);
    }

    #[test]
    fn month_labels_are_calendar_abbreviations() {
        assert_eq!(month_abbrev(1), "Jan");
        assert_eq!(month_abbrev(12), "Dec");
        assert_eq!(month_abbrev(0), "???");
    }
}
