//! Driver features
//!
//! A feature is an optional named capability object registered on a driver.
//! Features are looked up by name and may hold a non-owning reference back
//! to their driver to cooperate with statements and result sets.

use super::backend::Backend;
use super::driver::{Driver, DriverInner};
use super::error::{DriverError, Result};
use super::value::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Deferred affected-row supplier bound to a result set; evaluated at most
/// once
pub type RowCountFn = Box<dyn FnOnce() -> Result<u64>>;

/// Optional named capability attached to a driver
pub trait Feature<B: Backend>: 'static {
    /// The name this feature registers under; it overrides whatever the
    /// caller might have wanted to call it
    fn name(&self) -> &'static str;

    /// Make the given driver this feature's owner
    fn attach(&self, driver: &Driver<B>);

    /// Capability downcast hook
    fn as_any(&self) -> &dyn Any;
}

/// How a driver resolves its features at construction time
pub enum FeatureSetup<B: Backend> {
    /// Register the default features
    Defaults,
    /// Register no features
    None,
    /// Register exactly one feature
    One(Rc<dyn Feature<B>>),
    /// Register several features
    Many(Vec<Rc<dyn Feature<B>>>),
}

impl<B: Backend> Default for FeatureSetup<B> {
    fn default() -> Self {
        FeatureSetup::Defaults
    }
}

/// Name → feature registry owned by a driver
pub struct FeatureSet<B: Backend> {
    features: HashMap<String, Rc<dyn Feature<B>>>,
}

impl<B: Backend> FeatureSet<B> {
    pub fn new() -> Self {
        Self {
            features: HashMap::new(),
        }
    }

    /// Store a feature under its declared name, replacing any prior entry
    pub fn add(&mut self, feature: Rc<dyn Feature<B>>) {
        self.features.insert(feature.name().to_string(), feature);
    }

    /// Look up a feature by name
    pub fn get(&self, name: &str) -> Option<Rc<dyn Feature<B>>> {
        self.features.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<B: Backend> Default for FeatureSet<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Default feature computing how many rows a query returned
///
/// Backends whose native API does not report row counts on result handles
/// get a deferred computation instead: the original query wrapped in
/// `SELECT COUNT(*)` and executed through the owning driver when (and only
/// when) the count is actually requested.
pub struct RowCounter<B: Backend> {
    driver: RefCell<Weak<DriverInner<B>>>,
}

impl<B: Backend> RowCounter<B> {
    pub const NAME: &'static str = "RowCounter";

    pub fn new() -> Self {
        Self {
            driver: RefCell::new(Weak::new()),
        }
    }

    /// Build the deferred count for a query
    ///
    /// Returns `None` when the counter has not been attached to a driver.
    pub fn row_count_fn(&self, sql: &str) -> Option<RowCountFn> {
        let driver = self.driver.borrow().clone();
        driver.upgrade()?;

        let count_sql = format!(
            "SELECT COUNT(*) AS row_count FROM ({}) AS original_query",
            sql
        );
        Some(Box::new(move || {
            let inner = driver.upgrade().ok_or_else(|| {
                DriverError::statement("row counter is detached from its driver")
            })?;
            let driver = Driver::from_inner(inner);
            let mut statement = driver.create_statement(count_sql.as_str())?;
            let mut result = statement.execute(&[])?;
            let row = result
                .advance()?
                .ok_or_else(|| DriverError::statement("row count query returned no rows"))?;
            let count = row
                .get("row_count")
                .and_then(Value::as_long)
                .ok_or_else(|| DriverError::statement("row count query returned no count"))?;
            Ok(count.max(0) as u64)
        }))
    }
}

impl<B: Backend> Default for RowCounter<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Feature<B> for RowCounter<B> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn attach(&self, driver: &Driver<B>) {
        *self.driver.borrow_mut() = Rc::downgrade(driver.inner());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{CannedResponse, MemoryBackend, MemoryConnectionHandle};
    use crate::core::connection::ConnectionSource;

    struct NamedFeature {
        tag: u32,
    }

    impl Feature<MemoryBackend> for NamedFeature {
        fn name(&self) -> &'static str {
            "x"
        }

        fn attach(&self, _driver: &Driver<MemoryBackend>) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_same_name_registration_replaces() {
        let driver = Driver::<MemoryBackend>::with_defaults(crate::core::ConnectionParams::new());
        driver.add_feature(Rc::new(NamedFeature { tag: 1 }));
        driver.add_feature(Rc::new(NamedFeature { tag: 2 }));

        let feature = driver.get_feature("x").unwrap();
        let named = feature.as_any().downcast_ref::<NamedFeature>().unwrap();
        assert_eq!(named.tag, 2);
    }

    #[test]
    fn test_unattached_row_counter_yields_no_closure() {
        let counter = RowCounter::<MemoryBackend>::new();
        assert!(counter.row_count_fn("SELECT 1").is_none());
    }

    #[test]
    fn test_row_counter_counts_through_the_driver() {
        let handle = MemoryConnectionHandle::new();
        handle.push_response(
            CannedResponse::new()
                .columns(["id"])
                .row([Value::Long(1)])
                .row([Value::Long(2)]),
        );
        handle.push_response(
            CannedResponse::new()
                .columns(["row_count"])
                .row([Value::Long(2)]),
        );

        let driver =
            Driver::<MemoryBackend>::with_defaults(ConnectionSource::Handle(handle.clone()));
        let mut statement = driver.create_statement("SELECT id FROM t").unwrap();
        let mut result = statement.execute(&[]).unwrap();

        assert_eq!(result.affected_rows().unwrap(), 2);
        let executed = handle.executed();
        assert_eq!(executed.len(), 2);
        assert!(executed[1].sql.contains("COUNT(*)"));
    }
}
