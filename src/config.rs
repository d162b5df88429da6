//! # Global configuration.
//!
//! Provides [`Config`] centralized settings for tasks and their observers.
//!
//! Config is used in three places:
//! 1. **Task creation**: `TaskBuilder::with_config(&config)` sizes the per-task status channel
//! 2. **Event bus**: `Bus::from_config(&config)` sizes the shared broadcast ring
//! 3. **History**: `StatusHistory::from_config(&config)` bounds per-task history
//!
//! ## Sentinel values
//! - `history_limit = 0` → unbounded history
//! - `bus_capacity = 0` / `status_capacity = 0` → clamped to 1

/// Global configuration for tasks and observers.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `status_capacity`: Per-task status broadcast ring size (min 1)
/// - `history_limit`: Transitions kept per task by `StatusHistory` (`0` = unbounded)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the shared event bus broadcast channel.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` events
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Capacity of each task's own status broadcast channel.
    ///
    /// A task emits at most a handful of transitions in its lifetime, so the
    /// default is small.
    pub status_capacity: usize,

    /// Number of transitions retained per task by `StatusHistory`.
    ///
    /// - `0` = unbounded
    /// - `n > 0` = oldest entries are evicted past `n`
    pub history_limit: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a status channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn status_capacity_clamped(&self) -> usize {
        self.status_capacity.max(1)
    }

    /// Returns the history limit as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` entries per task
    #[inline]
    pub fn history_limit(&self) -> Option<usize> {
        if self.history_limit == 0 {
            None
        } else {
            Some(self.history_limit)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `status_capacity = 64`
    /// - `history_limit = 32`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            status_capacity: 64,
            history_limit: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        let cfg = Config {
            bus_capacity: 0,
            status_capacity: 0,
            history_limit: 0,
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.status_capacity_clamped(), 1);
        assert_eq!(cfg.history_limit(), None);
        assert_eq!(Config::default().history_limit(), Some(32));
    }
}
