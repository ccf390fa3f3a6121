//! Driver façade
//!
//! A [`Driver`] ties together exactly one [`Connection`], a statement
//! prototype, a result prototype, a feature registry and an optional
//! profiler. New statements and result sets are produced by cloning the
//! prototypes and initializing the clone with the call's native resources;
//! the prototypes themselves are never handed out mutably.

use super::backend::{Backend, ParameterStyle};
use super::connection::{Connection, ConnectionParams, ConnectionSource};
use super::error::{DriverError, Result};
use super::feature::{Feature, FeatureSet, FeatureSetup, RowCounter};
use super::profiler::{Profiler, ProfilerAware};
use super::result::{ResultPrototype, ResultSet};
use super::statement::{Statement, StatementPrototype, StatementSource};
use super::value::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Effective driver options: the supplied pairs intersected with the
/// backend's allow-list of recognized keys
///
/// Unrecognized keys are silently dropped so that option maps stay
/// forward-compatible across backends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverOptions {
    values: BTreeMap<String, Value>,
}

impl DriverOptions {
    /// Build the effective options for backend `B` from arbitrary pairs
    pub fn recognized<B, K, V, I>(pairs: I) -> Self
    where
        B: Backend,
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| B::RECOGNIZED_OPTIONS.contains(&k.as_str()))
            .collect();
        Self { values }
    }

    /// Look up an option value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Check whether an option key survived the intersection
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of effective options
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether no options are in effect
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) struct DriverInner<B: Backend> {
    pub(crate) connection: RefCell<Connection<B>>,
    pub(crate) statement_prototype: RefCell<StatementPrototype>,
    pub(crate) result_prototype: RefCell<ResultPrototype>,
    pub(crate) features: RefCell<FeatureSet<B>>,
    pub(crate) profiler: RefCell<Option<Rc<dyn Profiler>>>,
    pub(crate) options: DriverOptions,
}

/// Top-level façade over one native database connection
pub struct Driver<B: Backend> {
    inner: Rc<DriverInner<B>>,
}

impl<B: Backend> Clone for Driver<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> Driver<B> {
    /// Construct a driver from a connection source, option pairs and a
    /// feature specification
    ///
    /// Options are intersected with the backend's allow-list; unrecognized
    /// keys are dropped without error.
    pub fn new<S, K, V>(
        source: S,
        options: impl IntoIterator<Item = (K, V)>,
        features: FeatureSetup<B>,
    ) -> Self
    where
        S: Into<ConnectionSource<B>>,
        K: Into<String>,
        V: Into<Value>,
    {
        let options = DriverOptions::recognized::<B, K, V, _>(options);
        let driver = Self {
            inner: Rc::new(DriverInner {
                connection: RefCell::new(Connection::new(ConnectionParams::default())),
                statement_prototype: RefCell::new(StatementPrototype::default()),
                result_prototype: RefCell::new(ResultPrototype::default()),
                features: RefCell::new(FeatureSet::new()),
                profiler: RefCell::new(None),
                options,
            }),
        };

        let connection = match source.into() {
            ConnectionSource::Params(params) => Connection::new(params),
            ConnectionSource::Established(connection) => connection,
            ConnectionSource::Handle(handle) => Connection::from_handle(handle),
        };
        driver.register_connection(connection);
        driver.register_statement_prototype(StatementPrototype::default());
        driver.register_result_prototype(ResultPrototype::default());

        match features {
            FeatureSetup::Defaults => {
                driver.setup_default_features();
            }
            FeatureSetup::One(feature) => {
                driver.add_feature(feature);
            }
            FeatureSetup::Many(features) => {
                for feature in features {
                    driver.add_feature(feature);
                }
            }
            FeatureSetup::None => {}
        }

        driver
    }

    /// Construct a driver with no extra options and the default features
    pub fn with_defaults<S: Into<ConnectionSource<B>>>(source: S) -> Self {
        Self::new(
            source,
            std::iter::empty::<(String, Value)>(),
            FeatureSetup::Defaults,
        )
    }

    pub(crate) fn from_inner(inner: Rc<DriverInner<B>>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<DriverInner<B>> {
        &self.inner
    }

    /// Install a connection, handing it the effective options and the
    /// current profiler
    pub fn register_connection(&self, mut connection: Connection<B>) -> &Self {
        connection.set_options(self.inner.options.clone());
        if let Some(profiler) = self.inner.profiler.borrow().as_ref() {
            connection.set_profiler(Rc::clone(profiler));
        }
        *self.inner.connection.borrow_mut() = connection;
        self
    }

    /// Install the template every created statement is cloned from
    pub fn register_statement_prototype(&self, mut prototype: StatementPrototype) -> &Self {
        if let Some(profiler) = self.inner.profiler.borrow().as_ref() {
            prototype.set_profiler(Rc::clone(profiler));
        }
        *self.inner.statement_prototype.borrow_mut() = prototype;
        self
    }

    /// Install the template every created result set is cloned from
    pub fn register_result_prototype(&self, prototype: ResultPrototype) -> &Self {
        *self.inner.result_prototype.borrow_mut() = prototype;
        self
    }

    /// Current statement template
    pub fn statement_prototype(&self) -> StatementPrototype {
        self.inner.statement_prototype.borrow().clone()
    }

    /// Current result template
    pub fn result_prototype(&self) -> ResultPrototype {
        self.inner.result_prototype.borrow().clone()
    }

    /// Borrow the owned connection
    pub fn connection(&self) -> Ref<'_, Connection<B>> {
        self.inner.connection.borrow()
    }

    /// Mutably borrow the owned connection
    pub fn connection_mut(&self) -> RefMut<'_, Connection<B>> {
        self.inner.connection.borrow_mut()
    }

    /// The effective (allow-list intersected) options
    pub fn options(&self) -> &DriverOptions {
        &self.inner.options
    }

    /// Register a feature under its own declared name, replacing any prior
    /// entry with that name, and make this driver its owner
    pub fn add_feature(&self, feature: Rc<dyn Feature<B>>) -> &Self {
        feature.attach(self);
        self.inner.features.borrow_mut().add(feature);
        self
    }

    /// Register the default features
    pub fn setup_default_features(&self) -> &Self {
        self.add_feature(Rc::new(RowCounter::<B>::new()))
    }

    /// Look up a registered feature; `None` means not registered
    pub fn get_feature(&self, name: &str) -> Option<Rc<dyn Feature<B>>> {
        self.inner.features.borrow().get(name)
    }

    /// Verify the backend's native capability is present
    pub fn check_environment() -> Result<()> {
        B::check_environment()
    }

    /// Produce a statement from SQL text, an existing native statement
    /// handle, or nothing
    ///
    /// SQL text is stored for deferred preparation; a native handle of the
    /// wrong kind is rejected with `InvalidArgument`. The connection is
    /// connected (idempotently) for statements that will prepare against
    /// it.
    pub fn create_statement<S: Into<StatementSource<B>>>(
        &self,
        source: S,
    ) -> Result<Statement<B>> {
        let mut statement = self
            .inner
            .statement_prototype
            .borrow()
            .instantiate(Rc::downgrade(&self.inner));

        match source.into() {
            StatementSource::Native(handle) => {
                if !B::statement_handle_usable(&handle) {
                    return Err(DriverError::invalid_argument(format!(
                        "{} only accepts SQL text or a usable native statement handle \
                         in create_statement",
                        B::PLATFORM_NAME
                    )));
                }
                statement.set_resource(handle);
            }
            StatementSource::Sql(sql) => {
                statement.set_sql(sql);
                self.inner.connection.borrow_mut().connect()?;
            }
            StatementSource::Empty => {
                self.inner.connection.borrow_mut().connect()?;
            }
        }
        Ok(statement)
    }

    /// Wrap a native result handle into a result set
    ///
    /// When a statement context is supplied, the registered row counter
    /// feature exists and the handle carries fields, the counter's deferred
    /// computation is bound for later `affected_rows` evaluation.
    pub fn create_result(&self, handle: B::ResultHandle, context: Option<&str>) -> ResultSet<B> {
        let mut deferred = None;
        if let Some(sql) = context {
            if let Some(feature) = self.get_feature(RowCounter::<B>::NAME) {
                if let Some(counter) = feature.as_any().downcast_ref::<RowCounter<B>>() {
                    if B::field_count(&handle) > 0 {
                        deferred = counter.row_count_fn(sql);
                    }
                }
            }
        }
        let generated = self.inner.connection.borrow().last_generated_value();
        self.inner
            .result_prototype
            .borrow()
            .instantiate(handle, generated, deferred)
    }

    /// Attach a profiler, propagating it to the connection and the
    /// statement prototype
    pub fn set_profiler(&self, profiler: Rc<dyn Profiler>) -> &Self {
        *self.inner.profiler.borrow_mut() = Some(Rc::clone(&profiler));
        self.inner
            .connection
            .borrow_mut()
            .set_profiler(Rc::clone(&profiler));
        self.inner
            .statement_prototype
            .borrow_mut()
            .set_profiler(profiler);
        self
    }

    /// The attached profiler, if any
    pub fn profiler(&self) -> Option<Rc<dyn Profiler>> {
        self.inner.profiler.borrow().clone()
    }

    /// Platform name of the backend
    pub fn platform_name() -> &'static str {
        B::PLATFORM_NAME
    }

    /// Parameter placeholder convention of the backend
    pub fn prepare_type() -> ParameterStyle {
        B::PREPARE_TYPE
    }

    /// Apply the backend's bind-marker convention to a parameter name
    pub fn format_parameter_name(name: &str) -> String {
        B::PREPARE_TYPE.format_parameter_name(name)
    }

    /// Last generated key reported by the owned connection
    pub fn last_generated_value(&self) -> Option<Value> {
        self.inner.connection.borrow().last_generated_value()
    }
}
