//! Profiler observer seam
//!
//! Components that accept a profiler advertise it through the
//! [`ProfilerAware`] capability trait; the driver checks the capability at
//! registration time and propagates its profiler to every aware component.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Observer notified around native calls.
///
/// `start` fires immediately before a native prepare/execute/command call,
/// `finish` immediately after it returns.
pub trait Profiler {
    /// A native call is about to be issued for the given SQL
    fn start(&self, sql: &str);

    /// The native call issued by the matching `start` has returned
    fn finish(&self);
}

/// Capability of carrying a profiler.
pub trait ProfilerAware {
    fn set_profiler(&mut self, profiler: Rc<dyn Profiler>);
}

/// Profiler that reports timings through the `log` facade at debug level.
#[derive(Default)]
pub struct LogProfiler {
    started: Cell<Option<Instant>>,
}

impl LogProfiler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Profiler for LogProfiler {
    fn start(&self, sql: &str) {
        self.started.set(Some(Instant::now()));
        log::debug!(target: "unidriver::profiler", "start: {}", sql);
    }

    fn finish(&self) {
        match self.started.take() {
            Some(started) => log::debug!(
                target: "unidriver::profiler",
                "finish: {:?} elapsed",
                started.elapsed()
            ),
            None => log::debug!(target: "unidriver::profiler", "finish: unmatched"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Profiler that records event order for assertions.
    #[derive(Default)]
    struct RecordingProfiler {
        events: RefCell<Vec<String>>,
    }

    impl Profiler for RecordingProfiler {
        fn start(&self, sql: &str) {
            self.events.borrow_mut().push(format!("start:{}", sql));
        }

        fn finish(&self) {
            self.events.borrow_mut().push("finish".to_string());
        }
    }

    #[test]
    fn test_profiler_event_order() {
        let profiler = RecordingProfiler::default();
        profiler.start("SELECT 1");
        profiler.finish();

        assert_eq!(
            *profiler.events.borrow(),
            vec!["start:SELECT 1".to_string(), "finish".to_string()]
        );
    }

    #[test]
    fn test_log_profiler_unmatched_finish() {
        let profiler = LogProfiler::new();
        // A finish without a start must not panic
        profiler.finish();
    }
}
