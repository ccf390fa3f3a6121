//! Forward-only result sets
//!
//! A [`ResultSet`] owns one native result handle and drives it strictly
//! forward: rows can be peeked and advanced over, never revisited. The
//! current row is fetched lazily and cached, so repeated peeks at the same
//! position cost one native fetch.

use super::backend::Backend;
use super::error::{DriverError, Result};
use super::feature::RowCountFn;
use super::value::{Row, Value};

enum FetchState {
    /// Nothing fetched for the current position yet
    NotFetched,
    /// Fetched by a bare peek; `None` is the end-of-stream sentinel
    Peeked(Option<Row>),
    /// Fetched by forward movement
    Consumed(Option<Row>),
}

enum RowCount {
    /// No supplier bound; fall through to the native count
    Unknown,
    /// Deferred supplier, evaluated at most once
    Deferred(RowCountFn),
    /// Evaluated supplier outcome
    Known(u64),
}

/// Configured template cloned for every created result set
#[derive(Clone, Default)]
pub struct ResultPrototype {
    buffered: bool,
}

impl ResultPrototype {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn instantiate<B: Backend>(
        &self,
        handle: B::ResultHandle,
        generated_value: Option<Value>,
        row_count: Option<RowCountFn>,
    ) -> ResultSet<B> {
        let mut result = ResultSet::initialize(handle, generated_value, row_count);
        result.buffered = self.buffered;
        result
    }
}

/// Forward-only view over one native result handle
pub struct ResultSet<B: Backend> {
    handle: B::ResultHandle,
    position: usize,
    current: FetchState,
    generated_value: Option<Value>,
    row_count: RowCount,
    buffered: bool,
}

impl<B: Backend> ResultSet<B> {
    /// Wrap a native result handle
    ///
    /// `generated_value` is the key reported for an insert, when the
    /// platform supports one. `row_count` is an optional deferred
    /// affected-row supplier, used by backends whose native API does not
    /// report counts on result handles; it is evaluated at most once.
    pub fn initialize(
        handle: B::ResultHandle,
        generated_value: Option<Value>,
        row_count: Option<RowCountFn>,
    ) -> Self {
        Self {
            handle,
            position: 0,
            current: FetchState::NotFetched,
            generated_value,
            row_count: match row_count {
                Some(supplier) => RowCount::Deferred(supplier),
                None => RowCount::Unknown,
            },
            buffered: false,
        }
    }

    /// The row at the current position, fetching it lazily
    ///
    /// Repeated calls at the same position return the cached row without
    /// touching the native cursor. `None` is the end of the stream.
    pub fn current(&mut self) -> Result<Option<Row>> {
        match &self.current {
            FetchState::NotFetched => {
                let row = B::fetch(&mut self.handle)?;
                self.current = FetchState::Peeked(row.clone());
                Ok(row)
            }
            FetchState::Peeked(row) | FetchState::Consumed(row) => Ok(row.clone()),
        }
    }

    /// Move to the next row and return it
    ///
    /// Performs a fresh native fetch and increments the position. Once the
    /// end of the stream has been seen, further calls return `None`
    /// without touching the native cursor.
    pub fn advance(&mut self) -> Result<Option<Row>> {
        if self.exhausted() {
            return Ok(None);
        }
        let row = B::fetch(&mut self.handle)?;
        self.current = FetchState::Consumed(row.clone());
        self.position += 1;
        Ok(row)
    }

    /// Perform the first fetch
    ///
    /// Legal only before any forward movement; afterwards the native
    /// cursor cannot go back, so this fails with `UnsupportedOperation`
    /// and leaves the cursor untouched. A row already peeked at position 0
    /// is kept rather than fetched again.
    pub fn rewind(&mut self) -> Result<()> {
        if self.position > 0 {
            return Err(DriverError::unsupported(
                "this is a forward-only result set, calling rewind() after moving forward \
                 is not supported",
            ));
        }
        let row = match std::mem::replace(&mut self.current, FetchState::NotFetched) {
            FetchState::Peeked(row) => row,
            _ => B::fetch(&mut self.handle)?,
        };
        self.current = FetchState::Consumed(row);
        self.position = 1;
        Ok(())
    }

    /// True while the last fetch was not the end-of-stream sentinel
    pub fn is_valid(&self) -> bool {
        !self.exhausted()
    }

    /// Zero-based position of the forward-only cursor
    pub fn position(&self) -> usize {
        self.position
    }

    /// Rows affected or returned
    ///
    /// A bound deferred supplier wins over the native count and is
    /// evaluated at most once; its outcome is cached.
    pub fn affected_rows(&mut self) -> Result<u64> {
        match std::mem::replace(&mut self.row_count, RowCount::Unknown) {
            RowCount::Deferred(supplier) => {
                let count = supplier()?;
                self.row_count = RowCount::Known(count);
                Ok(count)
            }
            RowCount::Known(count) => {
                self.row_count = RowCount::Known(count);
                Ok(count)
            }
            RowCount::Unknown => Ok(B::affected_rows(&self.handle)),
        }
    }

    /// The generated key carried by this result, if any
    pub fn generated_value(&self) -> Option<&Value> {
        self.generated_value.as_ref()
    }

    /// Number of fields the native handle carries
    pub fn field_count(&self) -> usize {
        B::field_count(&self.handle)
    }

    /// Whether this result carries rows (field count > 0)
    pub fn is_query_result(&self) -> bool {
        self.field_count() > 0
    }

    /// Request buffering; forward-only handles cannot buffer, so this is
    /// a no-op
    pub fn buffer(&mut self) {}

    /// Whether rows are buffered; always false for forward-only handles
    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Always 0: an accurate row count is unknowable without buffering
    /// the entire stream, and this contract refuses to approximate
    pub fn count(&self) -> usize {
        0
    }

    /// Borrow the native result handle
    pub fn resource(&self) -> &B::ResultHandle {
        &self.handle
    }

    fn exhausted(&self) -> bool {
        matches!(
            self.current,
            FetchState::Peeked(None) | FetchState::Consumed(None)
        )
    }
}

impl<B: Backend> std::fmt::Debug for ResultSet<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("position", &self.position)
            .field("buffered", &self.buffered)
            .field("generated_value", &self.generated_value)
            .finish()
    }
}

impl<B: Backend> Iterator for ResultSet<B> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{CannedResponse, MemoryBackend};

    fn result_with_rows(n: usize) -> (ResultSet<MemoryBackend>, std::rc::Rc<std::cell::Cell<usize>>) {
        let mut response = CannedResponse::new().columns(["id"]);
        for i in 0..n {
            response = response.row([Value::Long(i as i64)]);
        }
        let probe = response.fetch_probe();
        let result = ResultSet::initialize(response.into_result_handle(), None, None);
        (result, probe)
    }

    #[test]
    fn test_current_is_idempotent_at_one_position() {
        let (mut result, probe) = result_with_rows(2);

        let first = result.current().unwrap();
        let again = result.current().unwrap();
        assert_eq!(first, again);
        assert_eq!(probe.get(), 1);
    }

    #[test]
    fn test_advance_walks_forward() {
        let (mut result, _) = result_with_rows(2);

        let row = result.advance().unwrap().unwrap();
        assert_eq!(row.get("id"), Some(&Value::Long(0)));
        assert_eq!(result.position(), 1);

        let row = result.advance().unwrap().unwrap();
        assert_eq!(row.get("id"), Some(&Value::Long(1)));
        assert_eq!(result.position(), 2);
    }

    #[test]
    fn test_exhaustion_is_idempotent_without_refetching() {
        let (mut result, probe) = result_with_rows(1);

        assert!(result.advance().unwrap().is_some());
        assert!(result.advance().unwrap().is_none());
        assert!(!result.is_valid());
        let fetches = probe.get();

        assert_eq!(result.current().unwrap(), None);
        assert_eq!(result.advance().unwrap(), None);
        assert_eq!(probe.get(), fetches);
    }

    #[test]
    fn test_rewind_only_before_moving_forward() {
        let (mut result, _) = result_with_rows(3);
        result.rewind().unwrap();
        assert_eq!(result.position(), 1);

        let err = result.rewind().unwrap_err();
        assert!(matches!(err, DriverError::UnsupportedOperation(_)));
        // Cursor state is unchanged and iteration continues
        let row = result.advance().unwrap().unwrap();
        assert_eq!(row.get("id"), Some(&Value::Long(1)));
    }

    #[test]
    fn test_rewind_after_peek_keeps_the_peeked_row() {
        let (mut result, probe) = result_with_rows(2);

        let peeked = result.current().unwrap();
        result.rewind().unwrap();
        assert_eq!(result.current().unwrap(), peeked);
        assert_eq!(probe.get(), 1);
    }

    #[test]
    fn test_count_is_always_zero() {
        let (result, _) = result_with_rows(5);
        assert_eq!(result.count(), 0);
    }

    #[test]
    fn test_iterator_yields_every_row() {
        let (result, _) = result_with_rows(3);
        let rows: Result<Vec<Row>> = result.collect();
        assert_eq!(rows.unwrap().len(), 3);
    }

    #[test]
    fn test_buffering_is_refused() {
        let (mut result, _) = result_with_rows(1);
        result.buffer();
        assert!(!result.is_buffered());
    }

    #[test]
    fn test_deferred_row_count_evaluated_at_most_once() {
        use std::cell::Cell;
        use std::rc::Rc;

        let handle_response = CannedResponse::new().columns(["id"]);
        let evaluations = Rc::new(Cell::new(0));
        let seen = Rc::clone(&evaluations);
        let supplier: RowCountFn = Box::new(move || {
            seen.set(seen.get() + 1);
            Ok(7)
        });

        let mut result: ResultSet<MemoryBackend> =
            ResultSet::initialize(handle_response.into_result_handle(), None, Some(supplier));

        assert_eq!(result.affected_rows().unwrap(), 7);
        assert_eq!(result.affected_rows().unwrap(), 7);
        assert_eq!(evaluations.get(), 1);
    }
}
