use std::env;
use std::time::Duration;

/// Scheduling policy knobs. Defaults match the clinic calendar UI: a
/// 15-minute grid, 15-minute shortest visit, 12-hour longest visit, and
/// commits left unbounded unless the embedder opts into a timeout.
#[derive(Clone, Debug)]
pub struct Config {
    pub grid_minutes: i64,
    pub min_duration_minutes: i64,
    pub max_duration_minutes: i64,
    pub commit_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_minutes: 15,
            min_duration_minutes: 15,
            max_duration_minutes: 720,
            commit_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let grid_minutes = env::var("CALENDAR_GRID_MINUTES")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(defaults.grid_minutes);
        let min_duration_minutes = env::var("CALENDAR_MIN_DURATION_MINUTES")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(defaults.min_duration_minutes);
        let max_duration_minutes = env::var("CALENDAR_MAX_DURATION_MINUTES")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(defaults.max_duration_minutes);
        let commit_timeout = env::var("CALENDAR_COMMIT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        anyhow::ensure!(grid_minutes > 0, "CALENDAR_GRID_MINUTES must be positive");
        anyhow::ensure!(
            min_duration_minutes > 0 && min_duration_minutes <= max_duration_minutes,
            "CALENDAR_MIN_DURATION_MINUTES must be positive and not above the maximum"
        );

        Ok(Self {
            grid_minutes,
            min_duration_minutes,
            max_duration_minutes,
            commit_timeout,
        })
    }
}
