pub mod schema;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Process-wide mutable configuration store.
///
/// Values are stored and transmitted as strings; the typed accessors parse
/// on read and fall back to the caller's default when parsing fails. All
/// mutation and snapshot reads are serialized by a single lock so a read
/// observes either the value before or after a write, never a torn one.
///
/// Which keys are "critical" is not this store's concern: that policy lives
/// in [`schema`] and is applied by the settings API.
pub struct RuntimeConfig {
    values: Mutex<HashMap<String, String>>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
        }
    }

    /// Seed the store with every schema key present in the process
    /// environment.
    pub fn from_environment() -> Self {
        let store = Self::new();
        store.reload_from_environment();
        store
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str, default: &str) -> String {
        self.values()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values()
            .get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.values()
            .get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let guard = self.values();
        let Some(value) = guard.get(key) else {
            return default;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.values().contains_key(key)
    }

    /// Store a value and propagate it into the process environment so
    /// components reading the environment directly observe the same value.
    pub fn set(&self, key: &str, value: &str) {
        let mut guard = self.values();
        guard.insert(key.to_string(), value.to_string());
        std::env::set_var(key, value);
    }

    pub fn update_many(&self, updates: &HashMap<String, String>) {
        let mut guard = self.values();
        for (key, value) in updates {
            guard.insert(key.clone(), value.clone());
            std::env::set_var(key, value);
        }
    }

    /// Detached snapshot of the current values; callers cannot observe
    /// later mutations through it.
    pub fn get_all(&self) -> HashMap<String, String> {
        self.values().clone()
    }

    /// Re-read every schema key from the process environment, overwriting
    /// stored values for keys that are set there.
    pub fn reload_from_environment(&self) {
        let mut guard = self.values();
        for def in schema::all_settings() {
            if let Ok(value) = std::env::var(def.key) {
                guard.insert(def.key.to_string(), value);
            }
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
