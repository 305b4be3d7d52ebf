use std::collections::HashMap;

use serde_json::Value;

/// Values passed between the steps of one iteration.
///
/// A fresh context is created for every iteration and is consumed by the workflow runner, so
/// nothing extracted in one iteration can leak into the next or into another virtual user.
#[derive(Debug, Default)]
pub struct IterationContext {
    vu_id: usize,
    iteration_id: u64,
    values: HashMap<String, Value>,
}

impl IterationContext {
    pub fn new(vu_id: usize, iteration_id: u64) -> Self {
        Self {
            vu_id,
            iteration_id,
            values: HashMap::new(),
        }
    }

    pub fn vu_id(&self) -> usize {
        self.vu_id
    }

    pub fn iteration_id(&self) -> u64 {
        self.iteration_id
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
