//! Property-based tests for the forward-only cursor and the value system

use proptest::prelude::*;
use unidriver::backends::memory::{CannedResponse, MemoryConnectionHandle};
use unidriver::prelude::*;

fn scripted_select(rows: i64) -> (MemoryDriver, std::rc::Rc<std::cell::Cell<usize>>) {
    let mut response = CannedResponse::new().columns(["id"]);
    for i in 0..rows {
        response = response.row([Value::Long(i)]);
    }
    let probe = response.fetch_probe();

    let handle = MemoryConnectionHandle::new();
    handle.push_response(response);
    let driver = MemoryDriver::with_defaults(ConnectionSource::Handle(handle));
    (driver, probe)
}

fn select_all(driver: &MemoryDriver) -> ResultSet<unidriver::backends::MemoryBackend> {
    driver
        .create_statement("SELECT id FROM t")
        .unwrap()
        .execute(&[])
        .unwrap()
}

proptest! {
    /// Advancing yields exactly the scripted rows, in order, then the end
    /// sentinel, after which the cursor stays exhausted
    #[test]
    fn cursor_yields_every_row_exactly_once(rows in 0i64..32) {
        let (driver, _) = scripted_select(rows);
        let mut result = select_all(&driver);

        for expected in 0..rows {
            let row = result.advance().unwrap().unwrap();
            prop_assert_eq!(row.get("id"), Some(&Value::Long(expected)));
            prop_assert!(result.is_valid());
        }
        prop_assert!(result.advance().unwrap().is_none());
        prop_assert!(!result.is_valid());
        prop_assert!(result.advance().unwrap().is_none());
    }

    /// One native fetch per row plus one for the end sentinel, no matter
    /// how the stream is consumed afterwards
    #[test]
    fn cursor_never_overfetches(rows in 0i64..32) {
        let (driver, probe) = scripted_select(rows);
        let mut result = select_all(&driver);

        while result.advance().unwrap().is_some() {}
        let _ = result.current().unwrap();
        let _ = result.advance().unwrap();

        prop_assert_eq!(probe.get() as i64, rows + 1);
    }

    /// Rewinding is refused after any forward movement
    #[test]
    fn rewind_fails_after_any_advance(rows in 1i64..32, advances in 1i64..32) {
        let (driver, _) = scripted_select(rows);
        let mut result = select_all(&driver);

        for _ in 0..advances.min(rows + 1) {
            result.advance().unwrap();
        }
        prop_assert!(matches!(
            result.rewind(),
            Err(DriverError::UnsupportedOperation(_))
        ));
    }

    /// The forward-only contract refuses to report a row count
    #[test]
    fn count_is_always_zero(rows in 0i64..32) {
        let (driver, _) = scripted_select(rows);
        let result = select_all(&driver);
        prop_assert_eq!(result.count(), 0);
    }

    /// Peeking is free of side effects: any number of peeks costs one
    /// native fetch and never moves the position
    #[test]
    fn peeking_never_advances(rows in 1i64..32, peeks in 1usize..8) {
        let (driver, probe) = scripted_select(rows);
        let mut result = select_all(&driver);

        for _ in 0..peeks {
            let row = result.current().unwrap().unwrap();
            prop_assert_eq!(row.get("id"), Some(&Value::Long(0)));
        }
        prop_assert_eq!(result.position(), 0);
        prop_assert_eq!(probe.get(), 1);
    }
}

proptest! {
    /// Integer accessors agree wherever both are defined
    #[test]
    fn int_accessors_agree(value in any::<i32>()) {
        let val = Value::from(value);
        prop_assert_eq!(val.as_int(), Some(value));
        prop_assert_eq!(val.as_long(), Some(value as i64));
    }

    /// Longs that fit in an i32 narrow losslessly; others refuse
    #[test]
    fn long_narrowing_is_checked(value in any::<i64>()) {
        let val = Value::from(value);
        match i32::try_from(value) {
            Ok(narrow) => prop_assert_eq!(val.as_int(), Some(narrow)),
            Err(_) => prop_assert_eq!(val.as_int(), None),
        }
    }

    /// String rendering of integral values parses back
    #[test]
    fn integral_display_parses_back(value in any::<i64>()) {
        let val = Value::from(value);
        prop_assert_eq!(Value::from(val.as_string()).as_long(), Some(value));
    }
}
