//! Storage drivers for Shelf
//!
//! `Native` serves a local folder and is the reference implementation of the
//! driver contract; other drivers plug into the same [`DriverRegistry`].

mod native;

pub use native::NativeDriver;

use shelf_core::{Account, Driver, ListingRules, ShelfError, ShelfResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of drivers, keyed by their configured name
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self { drivers: HashMap::new() }
    }

    /// Registry holding every built-in driver
    pub fn with_defaults(rules: Arc<ListingRules>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NativeDriver::new(rules)));
        registry
    }

    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        self.drivers.insert(driver.config().name, driver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    pub fn get_or_err(&self, name: &str) -> ShelfResult<Arc<dyn Driver>> {
        self.get(name).ok_or_else(|| ShelfError::DriverNotFound(name.to_string()))
    }

    /// The driver bound to `account`
    pub fn for_account(&self, account: &Account) -> ShelfResult<Arc<dyn Driver>> {
        self.get_or_err(&account.driver)
    }

    /// Registered driver names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults(Arc::new(ListingRules::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_include_native() {
        let registry = DriverRegistry::default();
        assert_eq!(registry.names(), vec!["Native"]);
        assert!(registry.get("Native").unwrap().config().only_proxy);
    }

    #[test]
    fn test_for_account() {
        let registry = DriverRegistry::default();
        let account = Account::new("media", "Native", "/srv/media");
        assert_eq!(registry.for_account(&account).unwrap().config().name, "Native");

        let account = Account::new("cloud", "Dropbox", "/");
        assert!(matches!(
            registry.for_account(&account),
            Err(ShelfError::DriverNotFound(name)) if name == "Dropbox"
        ));
    }

    #[test]
    fn test_register() {
        let mut registry = DriverRegistry::new();
        assert!(registry.names().is_empty());
        registry.register(Arc::new(NativeDriver::default()));
        assert_eq!(registry.names(), vec!["Native"]);
        assert!(registry.get_or_err("Native").is_ok());
    }
}
