//! Tuning knobs for a kitchen. Every field has a default, so partial data
//! files deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Seconds, try_secs};

/// Order generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Seconds between new orders, drawn uniformly from `[min, max)`.
    pub min_interval: f64,
    pub max_interval: f64,
    /// Seconds a customer waits, drawn uniformly from `[min, max)`.
    pub min_window: f64,
    pub max_window: f64,
    pub max_active: u32,
    /// Probability of drawing from the current rank's meals.
    pub rank_weight: f64,
    pub seed: u64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            min_interval: 20.0,
            max_interval: 60.0,
            min_window: 100.0,
            max_window: 300.0,
            max_active: 5,
            rank_weight: 0.7,
            seed: 0x5EED,
        }
    }
}

/// Order settings in simulation units, converted once up front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderTiming {
    pub interval: (Seconds, Seconds),
    pub window: (Seconds, Seconds),
    pub rank_weight: Fixed64,
}

impl OrderConfig {
    pub fn timing(&self) -> Result<OrderTiming, ConfigError> {
        Ok(OrderTiming {
            interval: (
                seconds("orders.min_interval", self.min_interval)?,
                seconds("orders.max_interval", self.max_interval)?,
            ),
            window: (
                seconds("orders.min_window", self.min_window)?,
                seconds("orders.max_window", self.max_window)?,
            ),
            rank_weight: seconds("orders.rank_weight", self.rank_weight)?,
        })
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Seconds, ConfigError> {
    try_secs(value).ok_or(ConfigError::OutOfRange { field, value })
}

/// Kitchen-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitchenConfig {
    /// Most units of one item type a station stack holds.
    pub per_type_cap: u32,
    pub plate_capacity: usize,
    /// Wash steps needed to clean an item.
    pub washing_threshold: u32,
    pub inventory_slots: usize,
    pub delivery_reward: u32,
    pub starting_money: u32,
    /// Seconds a rejection thought stays visible.
    pub thought_duration: f64,
    pub event_buffer_capacity: usize,
    /// Executed commands kept for replay. Zero keeps none.
    pub command_history: usize,
    pub orders: OrderConfig,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            per_type_cap: 3,
            plate_capacity: 4,
            washing_threshold: 3,
            inventory_slots: 10,
            delivery_reward: 50,
            starting_money: 200,
            thought_duration: 2.0,
            event_buffer_capacity: 1024,
            command_history: 256,
            orders: OrderConfig::default(),
        }
    }
}

impl KitchenConfig {
    pub fn thought_duration(&self) -> Result<Seconds, ConfigError> {
        seconds("thought_duration", self.thought_duration)
    }

    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thought_duration()?;
        self.orders.timing()?;
        let o = &self.orders;
        if o.min_interval < 0.0 || o.max_interval < o.min_interval {
            return Err(ConfigError::InvalidRange {
                field: "orders.interval",
                min: o.min_interval,
                max: o.max_interval,
            });
        }
        if o.min_window <= 0.0 || o.max_window < o.min_window {
            return Err(ConfigError::InvalidRange {
                field: "orders.window",
                min: o.min_window,
                max: o.max_window,
            });
        }
        if !(0.0..=1.0).contains(&o.rank_weight) {
            return Err(ConfigError::InvalidWeight(o.rank_weight));
        }
        if self.per_type_cap == 0 || self.plate_capacity == 0 || self.washing_threshold == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field}: min {min} must be non-negative and not above max {max}")]
    InvalidRange { field: &'static str, min: f64, max: f64 },
    #[error("{field}: {value} is not a representable number of seconds")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("rank weight {0} is outside [0, 1]")]
    InvalidWeight(f64),
    #[error("stack cap, plate capacity and washing threshold must be non-zero")]
    ZeroCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = KitchenConfig::default();
        assert_eq!(config.per_type_cap, 3);
        assert_eq!(config.orders.max_active, 5);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: KitchenConfig =
            serde_json::from_str(r#"{ "starting_money": 75, "orders": { "max_active": 2 } }"#).unwrap();
        assert_eq!(config.starting_money, 75);
        assert_eq!(config.orders.max_active, 2);
        assert_eq!(config.orders.min_window, 100.0);
        assert_eq!(config.plate_capacity, 4);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut config = KitchenConfig::default();
        config.orders.min_window = 50.0;
        config.orders.max_window = 10.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { field: "orders.window", .. })
        ));
    }

    #[test]
    fn weight_outside_unit_range_is_rejected() {
        let mut config = KitchenConfig::default();
        config.orders.rank_weight = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::InvalidWeight(1.5)));
    }

    #[test]
    fn unrepresentable_seconds_are_rejected() {
        let mut config = KitchenConfig::default();
        config.thought_duration = 1e12;
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "thought_duration", value: 1e12 })
        );

        let mut config = KitchenConfig::default();
        config.orders.max_window = 1e10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "orders.max_window", .. })
        ));

        let mut config = KitchenConfig::default();
        config.orders.min_interval = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "orders.min_interval", .. })
        ));
    }

    #[test]
    fn timing_converts_every_field() {
        let timing = OrderConfig::default().timing().unwrap();
        assert_eq!(timing.interval, (Seconds::from_num(20), Seconds::from_num(60)));
        assert_eq!(timing.window, (Seconds::from_num(100), Seconds::from_num(300)));
        assert_eq!(timing.rank_weight, try_secs(0.7).unwrap());
    }
}
