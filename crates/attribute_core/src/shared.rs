use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::attribute::{BoundedAttribute, Observer, ValueChange};
use crate::error::AttributeResult;

/// A [`BoundedAttribute`] that several threads may write to.
///
/// Each setter holds the lock across compare, clamp and notify, so the
/// observer of one write runs before any other write reads the value.
#[derive(Debug, Clone, Default)]
pub struct SharedAttribute {
    inner: Arc<Mutex<BoundedAttribute>>,
}

impl SharedAttribute {
    pub fn new(attribute: BoundedAttribute) -> Self {
        Self {
            inner: Arc::new(Mutex::new(attribute)),
        }
    }

    pub fn set_current(&self, requested: f32) -> AttributeResult<Option<ValueChange>> {
        self.lock().set_current(requested)
    }

    pub fn set_max(&self, new_max: f32) -> AttributeResult<Option<ValueChange>> {
        self.lock().set_max(new_max)
    }

    pub fn register_observer(&self, observer: Observer) {
        self.lock().register_observer(observer);
    }

    pub fn current(&self) -> f32 {
        self.lock().current()
    }

    pub fn max(&self) -> f32 {
        self.lock().max()
    }

    pub fn base(&self) -> f32 {
        self.lock().base()
    }

    // A panicking observer cannot leave the value half-written: commit stores
    // the value before calling it.
    fn lock(&self) -> MutexGuard<'_, BoundedAttribute> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
