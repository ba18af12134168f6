//! # Provider Registry
//!
//! The providers configured at startup, in configuration order and
//! addressable by name. Built once before the server starts and never
//! mutated afterwards, so handlers share it without locking.

use ll_core::ConfigError;
use ll_store::DataProvider;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn DataProvider>>,
    by_name: HashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn DataProvider>) -> Result<(), ConfigError> {
        let name = provider.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ConfigError::DuplicateProvider { name });
        }
        self.by_name.insert(name, self.providers.len());
        self.providers.push(provider);
        Ok(())
    }

    /// The provider named `key`, or the first configured one when no key
    /// is given.
    pub fn get(&self, key: Option<&str>) -> Option<Arc<dyn DataProvider>> {
        match key {
            Some(name) => self
                .by_name
                .get(name)
                .map(|&i| self.providers[i].clone()),
            None => self.providers.first().cloned(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
