//! # Plot
//!
//! The per-episode turn-state channel shared by every entity during a tick.
//!
//! Entities use the plot to credit reward, end the episode, leave log lines
//! for the consumer, and coordinate with each other through a typed key/value
//! store without knowing each other's types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value in the plot's store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlotValue {
    Count(i64),
    Flag(bool),
    Number(f64),
    Text(String),
}

impl PlotValue {
    pub fn as_count(&self) -> Option<i64> {
        match self {
            PlotValue::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PlotValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PlotValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PlotValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Shared mutable state for one episode.
///
/// Only the engine's update loop mutates a plot, one entity at a time, so it
/// needs no locking.
///
/// # Examples
///
/// ```
/// use symbolworld::Plot;
///
/// let mut plot = Plot::new();
/// assert_eq!(plot.reward(), None);
/// plot.add_reward(1.5);
/// plot.add_reward(2.0);
/// assert_eq!(plot.reward(), Some(3.5));
///
/// plot.increment("key_count");
/// assert_eq!(plot.count("key_count"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    frame: u64,
    reward: Option<f64>,
    episode_return: f64,
    discount: f64,
    game_over: bool,
    log: Vec<String>,
    store: BTreeMap<String, PlotValue>,
}

impl Default for Plot {
    fn default() -> Self {
        Self::new()
    }
}

impl Plot {
    /// Creates the plot for a fresh episode.
    pub fn new() -> Self {
        Self {
            frame: 0,
            reward: None,
            episode_return: 0.0,
            discount: 1.0,
            game_over: false,
            log: Vec::new(),
            store: BTreeMap::new(),
        }
    }

    /// Number of completed `step` calls in this episode.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Reward credited during the current tick, or None if nothing was credited.
    pub fn reward(&self) -> Option<f64> {
        self.reward
    }

    /// Sum of every reward credited this episode.
    pub fn episode_return(&self) -> f64 {
        self.episode_return
    }

    /// Discount reported to the caller: 1.0 while running, 0.0 after termination
    /// unless an entity chose another value.
    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Whether an entity has ended the episode.
    pub fn game_over(&self) -> bool {
        self.game_over
    }

    /// Credits reward for this tick. The first call initializes the total.
    pub fn add_reward(&mut self, reward: f64) {
        self.reward = Some(self.reward.unwrap_or(0.0) + reward);
        self.episode_return += reward;
    }

    /// Ends the episode with discount 0.0. Calling it again has no further effect.
    pub fn terminate_episode(&mut self) {
        self.terminate_episode_with_discount(0.0);
    }

    /// Ends the episode with a chosen discount. Only the first call sets it.
    pub fn terminate_episode_with_discount(&mut self, discount: f64) {
        if !self.game_over {
            self.game_over = true;
            self.discount = discount;
        }
    }

    /// Appends a message to this tick's log.
    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("plot[{}]: {}", self.frame, message);
        self.log.push(message);
    }

    /// Messages logged since the last drain.
    pub fn pending_log(&self) -> &[String] {
        &self.log
    }

    /// Removes and returns every pending log message.
    pub fn drain_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log)
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&PlotValue> {
        self.store.get(key)
    }

    /// Stores a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: PlotValue) -> Option<PlotValue> {
        self.store.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PlotValue> {
        self.store.remove(key)
    }

    /// Counter stored under `key`, if the key holds a count.
    pub fn count(&self, key: &str) -> Option<i64> {
        self.store.get(key).and_then(PlotValue::as_count)
    }

    /// Adds one to the counter under `key`, creating it at zero first.
    ///
    /// A non-counter value under the same key is replaced.
    pub fn increment(&mut self, key: &str) -> i64 {
        let next = self.count(key).unwrap_or(0) + 1;
        self.store.insert(key.to_string(), PlotValue::Count(next));
        next
    }

    /// Subtracts one from the counter under `key` if it is positive.
    ///
    /// Returns the new count, or None when there was nothing to take.
    pub fn decrement(&mut self, key: &str) -> Option<i64> {
        match self.count(key) {
            Some(count) if count > 0 => {
                self.store.insert(key.to_string(), PlotValue::Count(count - 1));
                Some(count - 1)
            }
            _ => None,
        }
    }

    /// Store keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.store.keys().map(String::as_str)
    }

    /// Drops any reward credited by the opening update, which happens before
    /// the first action and so belongs to no step.
    pub(crate) fn begin_episode(&mut self) {
        if self.reward.take().is_some() {
            log::debug!("discarding reward credited before the first step");
        }
        self.episode_return = 0.0;
    }

    /// Advances to the next tick: bumps the frame and clears the per-tick reward.
    pub(crate) fn begin_tick(&mut self) {
        self.frame += 1;
        self.reward = None;
    }
}
