/*!
 * Heap Configuration
 * Sizing, growth and coalescing settings with environment overrides
 */

use super::types::CoalescePolicy;
use crate::core::limits::{DEFAULT_MAX_MEM_SIZE, DEFAULT_MEM_STEP};
use crate::core::types::Size;
use log::warn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Environment variable overriding the initial buffer length in bytes
pub const ENV_CAPACITY: &str = "HEAP_CAPACITY";
/// Environment variable overriding the growth step in bytes
pub const ENV_GROWTH_STEP: &str = "HEAP_GROWTH_STEP";
/// Environment variable enabling elastic growth ("1"/"true")
pub const ENV_ELASTIC: &str = "HEAP_ELASTIC";
/// Environment variable selecting the coalescing policy ("ledger"/"address")
pub const ENV_COALESCE: &str = "HEAP_COALESCE";

/// Heap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Initial buffer length
    pub capacity: Size,
    /// Bytes added per growth
    pub growth_step: Size,
    /// Whether the buffer may grow
    pub elastic: bool,
    pub coalesce: CoalescePolicy,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MAX_MEM_SIZE,
            growth_step: DEFAULT_MEM_STEP,
            elastic: false,
            coalesce: CoalescePolicy::LedgerOrder,
        }
    }
}

impl HeapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration used by the process-wide heap: default sizes, elastic
    pub fn shared() -> Self {
        Self::default().with_elastic(true)
    }

    pub fn with_capacity(mut self, capacity: Size) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_growth_step(mut self, growth_step: Size) -> Self {
        self.growth_step = growth_step;
        self
    }

    pub fn with_elastic(mut self, elastic: bool) -> Self {
        self.elastic = elastic;
        self
    }

    pub fn with_coalesce(mut self, coalesce: CoalescePolicy) -> Self {
        self.coalesce = coalesce;
        self
    }

    /// Apply `HEAP_*` environment overrides on top of this configuration
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(capacity) = parse_var::<Size>(&lookup, ENV_CAPACITY) {
            self.capacity = capacity;
        }
        if let Some(step) = parse_var::<Size>(&lookup, ENV_GROWTH_STEP) {
            self.growth_step = step;
        }
        if let Some(raw) = lookup(ENV_ELASTIC) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.elastic = true,
                "0" | "false" | "no" => self.elastic = false,
                other => warn!("Ignoring {}={}: expected true or false", ENV_ELASTIC, other),
            }
        }
        if let Some(policy) = parse_var::<CoalescePolicy>(&lookup, ENV_COALESCE) {
            self.coalesce = policy;
        }
        self
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={}: {}", key, raw, e);
            None
        }
    }
}
