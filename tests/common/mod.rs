#![allow(dead_code)]

pub use spingroup_test_utils::builders;
pub use spingroup_test_utils::{init_tracing, with_timeout, ConcurrencyProbe, SharedBuffer};

use std::time::{Duration, Instant};

/// Poll `cond` every few milliseconds until it holds or `limit` passes.
pub fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
