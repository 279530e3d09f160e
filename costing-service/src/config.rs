use serde::Deserialize;
use std::fs;

use tariff_core::{ScheduleError, TariffRule, TariffSchedule};

/// What to do with rows that fail classification: drop them (counting them
/// in the report) or return them in full alongside the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectPolicy {
    Exclude,
    Flag,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonConfig {
    pub name: String,
    pub months: Vec<u8>,
    pub peak_start_hour: u8,
    pub peak_end_hour: u8,
    pub peak_on_weekend: bool,
    pub peak_price: f64,
    pub offpeak_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub flat_rate: f64,
    pub on_parse_error: RejectPolicy,
    pub seasons: Vec<SeasonConfig>,
}

impl Default for EngineConfig {
    /// The residential time-of-use tariff the service ships with
    /// (prices in agorot per 100 kWh-equivalent units).
    fn default() -> Self {
        Self {
            flat_rate: 60.07,
            on_parse_error: RejectPolicy::Exclude,
            seasons: vec![
                SeasonConfig {
                    name: "Summer".to_string(),
                    months: vec![6, 7, 8, 9],
                    peak_start_hour: 17,
                    peak_end_hour: 23,
                    peak_on_weekend: false,
                    peak_price: 165.33,
                    offpeak_price: 48.15,
                },
                SeasonConfig {
                    name: "Winter".to_string(),
                    months: vec![12, 1, 2],
                    peak_start_hour: 17,
                    peak_end_hour: 22,
                    peak_on_weekend: true,
                    peak_price: 114.78,
                    offpeak_price: 41.84,
                },
                SeasonConfig {
                    name: "Transition".to_string(),
                    months: vec![3, 4, 5, 10, 11],
                    peak_start_hour: 17,
                    peak_end_hour: 23,
                    peak_on_weekend: false,
                    peak_price: 45.83,
                    offpeak_price: 40.84,
                },
            ],
        }
    }
}

impl EngineConfig {
    /// Build the validated schedule. An invalid season table (month gaps or
    /// overlaps, bad peak window) is a configuration error and must abort
    /// startup before any classification happens.
    pub fn into_schedule(&self) -> Result<TariffSchedule, ScheduleError> {
        let rules = self
            .seasons
            .iter()
            .map(|s| TariffRule {
                season: s.name.clone(),
                months: s.months.clone(),
                peak_start_hour: s.peak_start_hour,
                peak_end_hour: s.peak_end_hour,
                peak_on_weekend: s.peak_on_weekend,
                peak_price: s.peak_price,
                offpeak_price: s.offpeak_price,
            })
            .collect();
        TariffSchedule::new(rules, self.flat_rate)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Lines to skip before the two-column data rows of a meter export file.
    pub skip_rows: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { skip_rows: 13 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub source: SourceConfig,
    pub http: HttpConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Load configuration from `COSTING_CONFIG` (or `costing-config.toml`).
    /// An explicitly configured path must exist; with no file at the default
    /// path the compiled-in tariff is used.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var("COSTING_CONFIG") {
            Ok(path) => {
                let contents = fs::read_to_string(&path)?;
                let cfg: AppConfig = toml::from_str(&contents)?;
                Ok(cfg)
            }
            Err(_) => {
                let path = "costing-config.toml";
                if fs::metadata(path).is_ok() {
                    let contents = fs::read_to_string(path)?;
                    let cfg: AppConfig = toml::from_str(&contents)?;
                    Ok(cfg)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tariff_is_a_valid_schedule() {
        let schedule = EngineConfig::default().into_schedule().unwrap();
        assert_eq!(schedule.flat_rate(), 60.07);
        assert_eq!(schedule.rules().len(), 3);
        for month in 1..=12u8 {
            assert!(schedule.season_of(month).is_ok());
        }
    }

    #[test]
    fn partial_engine_section_falls_back_to_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [engine]
            flat_rate = 55.0

            [source]
            skip_rows = 2
            "#,
        )
        .unwrap();

        assert_eq!(cfg.engine.flat_rate, 55.0);
        assert_eq!(cfg.engine.on_parse_error, RejectPolicy::Exclude);
        assert_eq!(cfg.engine.seasons.len(), 3);
        assert_eq!(cfg.source.skip_rows, 2);
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn season_table_is_configurable() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [engine]
            flat_rate = 50.0
            on_parse_error = "flag"

            [[engine.seasons]]
            name = "AllYear"
            months = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
            peak_start_hour = 8
            peak_end_hour = 20
            peak_on_weekend = true
            peak_price = 120.0
            offpeak_price = 40.0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.engine.on_parse_error, RejectPolicy::Flag);
        let schedule = cfg.engine.into_schedule().unwrap();
        assert_eq!(schedule.rules().len(), 1);
        assert_eq!(schedule.season_of(6).unwrap(), "AllYear");
    }
}
