use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Which hotspot dataset applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    Day,
    Night,
}

/// What the user asked for. `Auto` follows the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeModeSetting {
    #[default]
    Auto,
    Day,
    Night,
}

// Incidents between 21:00 and 04:59 feed the night dataset
pub fn is_night_hour(hour: u32) -> bool {
    hour >= 21 || hour <= 4
}

/// Resolve the dataset for `clock_hour` (0-23, local time) and an optional override.
pub fn resolve(clock_hour: u32, setting: TimeModeSetting) -> TimeMode {
    match setting {
        TimeModeSetting::Day => TimeMode::Day,
        TimeModeSetting::Night => TimeMode::Night,
        TimeModeSetting::Auto if is_night_hour(clock_hour) => TimeMode::Night,
        TimeModeSetting::Auto => TimeMode::Day,
    }
}

/// [`resolve`] against the current local wall clock.
pub fn resolve_now(setting: TimeModeSetting) -> TimeMode {
    resolve(chrono::Local::now().hour(), setting)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn night_window_wraps_midnight() {
        let night: Vec<u32> = (0..24).filter(|&h| is_night_hour(h)).collect();
        assert_eq!(night, vec![0, 1, 2, 3, 4, 21, 22, 23]);
    }

    #[test]
    fn auto_follows_clock() {
        assert_eq!(resolve(4, TimeModeSetting::Auto), TimeMode::Night);
        assert_eq!(resolve(5, TimeModeSetting::Auto), TimeMode::Day);
        assert_eq!(resolve(20, TimeModeSetting::Auto), TimeMode::Day);
        assert_eq!(resolve(21, TimeModeSetting::Auto), TimeMode::Night);
    }

    #[test]
    fn override_ignores_clock() {
        assert_eq!(resolve(2, TimeModeSetting::Day), TimeMode::Day);
        assert_eq!(resolve(12, TimeModeSetting::Night), TimeMode::Night);
    }

    #[test]
    fn setting_parses_lowercase() {
        let s: TimeModeSetting = serde_json::from_str(r#""night""#).unwrap();
        assert_eq!(s, TimeModeSetting::Night);
        assert_eq!(TimeModeSetting::default(), TimeModeSetting::Auto);
    }
}
