use serde::Serialize;

/// Pricing period within a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Peak,
    OffPeak,
}

/// One season of the tariff: the months it covers, its peak-hour window and
/// the two unit prices.
///
/// Prices are in currency units per 100 kWh, so `cost = kwh * price / 100`.
/// The peak window is half-open: `peak_start_hour` is the first peak hour and
/// `peak_end_hour` is the first hour back at the off-peak price.
#[derive(Debug, Clone)]
pub struct TariffRule {
    pub season: String,
    pub months: Vec<u8>,
    pub peak_start_hour: u8,
    pub peak_end_hour: u8,
    /// Whether the peak window also applies on Saturday/Sunday.
    pub peak_on_weekend: bool,
    pub peak_price: f64,
    pub offpeak_price: f64,
}

impl TariffRule {
    fn covers(&self, month: u8) -> bool {
        self.months.contains(&month)
    }

    fn is_peak(&self, hour: u8, is_weekend: bool) -> bool {
        let in_window = hour >= self.peak_start_hour && hour < self.peak_end_hour;
        in_window && (!is_weekend || self.peak_on_weekend)
    }
}

/// The price resolved for one (month, hour, weekday/weekend) combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote<'a> {
    pub season: &'a str,
    pub period: Period,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("tariff schedule has no rules")]
    Empty,
    #[error("season '{season}' lists invalid month {month}")]
    InvalidMonth { season: String, month: u8 },
    #[error("month {month} is covered by both '{first}' and '{second}'")]
    DuplicateMonth {
        month: u8,
        first: String,
        second: String,
    },
    #[error("month {month} is not covered by any season")]
    UncoveredMonth { month: u8 },
    #[error("season '{season}' has invalid peak window {start}..{end}")]
    InvalidPeakWindow { season: String, start: u8, end: u8 },
    #[error("no tariff rule matches month {month}")]
    NoRuleForMonth { month: u8 },
}

/// An immutable, validated time-of-use tariff: an ordered list of season
/// rules plus the flat-rate alternative price.
///
/// Construction fails unless the rules' month-sets partition 1..=12 exactly,
/// so lookups on a built schedule are total. Rules are consulted in
/// definition order; season buckets in reports follow the same order.
#[derive(Debug, Clone)]
pub struct TariffSchedule {
    rules: Vec<TariffRule>,
    flat_rate: f64,
}

impl TariffSchedule {
    pub fn new(rules: Vec<TariffRule>, flat_rate: f64) -> Result<Self, ScheduleError> {
        if rules.is_empty() {
            return Err(ScheduleError::Empty);
        }

        let mut covered_by: [Option<usize>; 13] = [None; 13];
        for (idx, rule) in rules.iter().enumerate() {
            if rule.peak_start_hour >= rule.peak_end_hour || rule.peak_end_hour > 24 {
                return Err(ScheduleError::InvalidPeakWindow {
                    season: rule.season.clone(),
                    start: rule.peak_start_hour,
                    end: rule.peak_end_hour,
                });
            }

            for &month in &rule.months {
                if !(1..=12).contains(&month) {
                    return Err(ScheduleError::InvalidMonth {
                        season: rule.season.clone(),
                        month,
                    });
                }
                match covered_by[month as usize] {
                    Some(first) => {
                        return Err(ScheduleError::DuplicateMonth {
                            month,
                            first: rules[first].season.clone(),
                            second: rule.season.clone(),
                        })
                    }
                    None => covered_by[month as usize] = Some(idx),
                }
            }
        }

        for month in 1..=12u8 {
            if covered_by[month as usize].is_none() {
                return Err(ScheduleError::UncoveredMonth { month });
            }
        }

        Ok(Self { rules, flat_rate })
    }

    /// Rules in definition order.
    pub fn rules(&self) -> &[TariffRule] {
        &self.rules
    }

    /// Flat-rate price, same unit convention as the rule prices.
    pub fn flat_rate(&self) -> f64 {
        self.flat_rate
    }

    /// Season label covering `month`. Total for months 1..=12 on a built
    /// schedule.
    pub fn season_of(&self, month: u8) -> Result<&str, ScheduleError> {
        self.rules
            .iter()
            .find(|r| r.covers(month))
            .map(|r| r.season.as_str())
            .ok_or(ScheduleError::NoRuleForMonth { month })
    }

    /// Resolve the unit price for one calendar position. First matching rule
    /// wins; after construction validation exactly one rule can match a
    /// valid month, and a miss is an internal invariant violation surfaced
    /// as an error rather than a default price.
    pub fn resolve_rate(
        &self,
        month: u8,
        hour: u8,
        is_weekend: bool,
    ) -> Result<RateQuote<'_>, ScheduleError> {
        let rule = self
            .rules
            .iter()
            .find(|r| r.covers(month))
            .ok_or(ScheduleError::NoRuleForMonth { month })?;

        let (period, unit_price) = if rule.is_peak(hour, is_weekend) {
            (Period::Peak, rule.peak_price)
        } else {
            (Period::OffPeak, rule.offpeak_price)
        };

        Ok(RateQuote {
            season: &rule.season,
            period,
            unit_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(
        season: &str,
        months: Vec<u8>,
        peak_start_hour: u8,
        peak_end_hour: u8,
        peak_on_weekend: bool,
        peak_price: f64,
        offpeak_price: f64,
    ) -> TariffRule {
        TariffRule {
            season: season.to_string(),
            months,
            peak_start_hour,
            peak_end_hour,
            peak_on_weekend,
            peak_price,
            offpeak_price,
        }
    }

    fn residential_tou() -> TariffSchedule {
        TariffSchedule::new(
            vec![
                rule("Summer", vec![6, 7, 8, 9], 17, 23, false, 165.33, 48.15),
                rule("Winter", vec![12, 1, 2], 17, 22, true, 114.78, 41.84),
                rule(
                    "Transition",
                    vec![3, 4, 5, 10, 11],
                    17,
                    23,
                    false,
                    45.83,
                    40.84,
                ),
            ],
            60.07,
        )
        .unwrap()
    }

    #[test]
    fn every_month_maps_to_exactly_one_season() {
        let schedule = residential_tou();
        for month in 1..=12u8 {
            let season = schedule.season_of(month).unwrap();
            let covering = schedule
                .rules()
                .iter()
                .filter(|r| r.months.contains(&month))
                .count();
            assert_eq!(covering, 1, "month {month} covered {covering} times");
            assert!(!season.is_empty());
        }
    }

    #[test]
    fn resolved_price_is_always_a_configured_price() {
        let schedule = residential_tou();
        for month in 1..=12u8 {
            for hour in 0..24u8 {
                for is_weekend in [false, true] {
                    let quote = schedule.resolve_rate(month, hour, is_weekend).unwrap();
                    let rule = schedule
                        .rules()
                        .iter()
                        .find(|r| r.months.contains(&month))
                        .unwrap();
                    assert_eq!(quote.season, rule.season);
                    assert!(
                        quote.unit_price == rule.peak_price
                            || quote.unit_price == rule.offpeak_price
                    );
                }
            }
        }
    }

    #[test]
    fn peak_window_is_half_open() {
        let schedule = residential_tou();

        // Summer window 17..23 on a weekday.
        assert_eq!(
            schedule.resolve_rate(7, 17, false).unwrap().period,
            Period::Peak
        );
        assert_eq!(
            schedule.resolve_rate(7, 22, false).unwrap().period,
            Period::Peak
        );
        assert_eq!(
            schedule.resolve_rate(7, 23, false).unwrap().period,
            Period::OffPeak
        );
        assert_eq!(
            schedule.resolve_rate(7, 16, false).unwrap().period,
            Period::OffPeak
        );

        // Winter window ends an hour earlier.
        assert_eq!(
            schedule.resolve_rate(1, 21, false).unwrap().period,
            Period::Peak
        );
        assert_eq!(
            schedule.resolve_rate(1, 22, false).unwrap().period,
            Period::OffPeak
        );
    }

    #[test]
    fn weekend_peak_depends_on_the_season_flag() {
        let schedule = residential_tou();

        // Summer evenings are off-peak on weekends.
        let quote = schedule.resolve_rate(7, 18, true).unwrap();
        assert_eq!(quote.period, Period::OffPeak);
        assert_eq!(quote.unit_price, 48.15);

        // Winter evenings stay peak on weekends.
        let quote = schedule.resolve_rate(12, 18, true).unwrap();
        assert_eq!(quote.period, Period::Peak);
        assert_eq!(quote.unit_price, 114.78);
    }

    #[test]
    fn uncovered_month_is_a_construction_error() {
        let err = TariffSchedule::new(
            vec![rule("Summer", vec![6, 7, 8, 9], 17, 23, false, 165.33, 48.15)],
            60.07,
        )
        .unwrap_err();
        assert_eq!(err, ScheduleError::UncoveredMonth { month: 1 });
    }

    #[test]
    fn duplicate_month_is_a_construction_error() {
        let err = TariffSchedule::new(
            vec![
                rule("Summer", vec![6, 7, 8, 9], 17, 23, false, 165.33, 48.15),
                rule("Winter", vec![9, 10, 11, 12, 1, 2, 3, 4, 5], 17, 22, true, 114.78, 41.84),
            ],
            60.07,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::DuplicateMonth {
                month: 9,
                first: "Summer".to_string(),
                second: "Winter".to_string(),
            }
        );
    }

    #[test]
    fn invalid_month_number_is_rejected() {
        let err = TariffSchedule::new(
            vec![rule("All", (1..=13).collect(), 17, 23, false, 100.0, 50.0)],
            60.07,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InvalidMonth {
                season: "All".to_string(),
                month: 13,
            }
        );
    }

    #[test]
    fn inverted_peak_window_is_rejected() {
        let err = TariffSchedule::new(
            vec![rule("All", (1..=12).collect(), 23, 17, false, 100.0, 50.0)],
            60.07,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidPeakWindow { .. }));
    }

    #[test]
    fn empty_schedule_is_rejected() {
        assert_eq!(
            TariffSchedule::new(Vec::new(), 60.07).unwrap_err(),
            ScheduleError::Empty
        );
    }
}
