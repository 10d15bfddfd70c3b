use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Smallest priority weight a planning run accepts.
pub const MIN_PRIORITY_WEIGHT: f64 = 0.01;

/// Tunables for a planning run.
///
/// Missing fields deserialize to their defaults; call [`PlanningOptions::normalized`]
/// before use so out-of-range values are clamped to their floors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningOptions {
    pub priority_weight: f64,
    pub due_date_weight: f64,
    /// `0` disables the due-date horizon filter.
    pub horizon_days: u32,
    /// `0` means every backlog order is scheduled.
    pub max_orders_per_cycle: usize,
    pub auto_release_orders: bool,
    /// Start time used when no explicit start reference is given.
    pub default_start_time: NaiveTime,
    pub setup_time_factor: f64,
    pub gap_between_operations_minutes: u32,
}

impl Default for PlanningOptions {
    fn default() -> Self {
        Self {
            priority_weight: 1.0,
            due_date_weight: 1.0,
            horizon_days: 0,
            max_orders_per_cycle: 0,
            auto_release_orders: true,
            default_start_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            setup_time_factor: 1.0,
            gap_between_operations_minutes: 0,
        }
    }
}

fn floor_at(value: f64, floor: f64) -> f64 {
    if value.is_finite() { value.max(floor) } else { floor }
}

impl PlanningOptions {
    /// Clamp weights and factors to their documented floors.
    pub fn normalized(mut self) -> Self {
        self.priority_weight = floor_at(self.priority_weight, MIN_PRIORITY_WEIGHT);
        self.due_date_weight = floor_at(self.due_date_weight, 0.0);
        self.setup_time_factor = floor_at(self.setup_time_factor, 0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shop_floor_conventions() {
        let options = PlanningOptions::default();
        assert_eq!(options.priority_weight, 1.0);
        assert_eq!(options.default_start_time, NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert!(options.auto_release_orders);
        assert_eq!(options.max_orders_per_cycle, 0);
    }

    #[test]
    fn normalized_clamps_to_floors() {
        let options = PlanningOptions {
            priority_weight: 0.0,
            due_date_weight: -3.0,
            setup_time_factor: f64::NAN,
            ..PlanningOptions::default()
        }
        .normalized();

        assert_eq!(options.priority_weight, MIN_PRIORITY_WEIGHT);
        assert_eq!(options.due_date_weight, 0.0);
        assert_eq!(options.setup_time_factor, 0.0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let options: PlanningOptions =
            serde_json::from_str(r#"{"horizon_days": 14, "setup_time_factor": 0.5}"#).unwrap();
        assert_eq!(options.horizon_days, 14);
        assert_eq!(options.setup_time_factor, 0.5);
        assert_eq!(options.due_date_weight, 1.0);
        assert!(options.auto_release_orders);
    }
}
