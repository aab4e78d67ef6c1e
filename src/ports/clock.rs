//! Clock port - source of "now" for expiry and windowing.

use crate::domain::foundation::Timestamp;

/// Wall clock abstraction so expiry logic can be driven in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
