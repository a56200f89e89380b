//! A numeric value held inside `[0, max]` that reports every change.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_non_negative, AttributeError, AttributeResult};

pub const DEFAULT_ATTRIBUTE_VALUE: f32 = 100.0;
pub const LOWER_BOUND: f32 = 0.0;

/// Called with `(old, new)` after the current value moved.
pub type Observer = Box<dyn FnMut(f32, f32) + Send + Sync>;

/// A committed change to an attribute's current value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueChange {
    pub old: f32,
    pub new: f32,
}

impl ValueChange {
    pub fn delta(&self) -> f32 {
        self.new - self.old
    }
}

/// Current value clamped to `[0, max]`, with a single optional observer.
///
/// The upper bound is read fresh on every write, so a `set_max` followed by a
/// `set_current` always clamps against the newest maximum.
pub struct BoundedAttribute {
    base: f32,
    current: f32,
    max: f32,
    observer: Option<Observer>,
}

impl BoundedAttribute {
    pub fn new() -> Self {
        Self {
            base: DEFAULT_ATTRIBUTE_VALUE,
            current: DEFAULT_ATTRIBUTE_VALUE,
            max: DEFAULT_ATTRIBUTE_VALUE,
            observer: None,
        }
    }

    pub fn base(&self) -> f32 {
        self.base
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Replaces whatever observer was registered before.
    pub fn register_observer(&mut self, observer: Observer) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// Moves the upper bound. A bound below the current value drags the
    /// current value down with it and notifies the observer.
    ///
    /// Returns the re-clamp of `current`, if one happened.
    pub fn set_max(&mut self, new_max: f32) -> AttributeResult<Option<ValueChange>> {
        let new_max = without_negative_zero(ensure_non_negative("max", new_max)?);
        self.max = new_max;
        if self.current > new_max {
            return Ok(Some(self.commit(new_max)));
        }
        Ok(None)
    }

    /// Clamps `requested` into `[0, max]` and commits it if it differs from
    /// the present value. Infinities saturate at the nearest bound; NaN is
    /// rejected.
    pub fn set_current(&mut self, requested: f32) -> AttributeResult<Option<ValueChange>> {
        if requested.is_nan() {
            return Err(AttributeError::invalid("current", requested, "must not be NaN"));
        }
        let clamped = without_negative_zero(requested.clamp(LOWER_BOUND, self.max));
        if clamped == self.current {
            return Ok(None);
        }
        Ok(Some(self.commit(clamped)))
    }

    /// Stores the unmodified base value, clamped at write time. Observers only
    /// track `current`, so this never notifies.
    pub fn set_base(&mut self, value: f32) -> AttributeResult<f32> {
        if value.is_nan() {
            return Err(AttributeError::invalid("base", value, "must not be NaN"));
        }
        self.base = without_negative_zero(value.clamp(LOWER_BOUND, self.max));
        Ok(self.base)
    }

    fn commit(&mut self, new: f32) -> ValueChange {
        let change = ValueChange {
            old: self.current,
            new,
        };
        self.current = new;
        debug!(
            target: "attribute_core.attribute",
            old = change.old,
            new = change.new,
            max = self.max,
            "current value committed"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer(change.old, change.new);
        }
        change
    }
}

// `clamp` passes `-0.0` through untouched; adding `+0.0` folds it to `0.0`.
fn without_negative_zero(value: f32) -> f32 {
    value + 0.0
}

impl Default for BoundedAttribute {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BoundedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedAttribute")
            .field("base", &self.base)
            .field("current", &self.current)
            .field("max", &self.max)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording() -> (BoundedAttribute, Arc<Mutex<Vec<(f32, f32)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut attr = BoundedAttribute::new();
        attr.register_observer(Box::new(move |old, new| {
            sink.lock().unwrap().push((old, new));
        }));
        (attr, seen)
    }

    #[test]
    fn starts_at_hundred() {
        let attr = BoundedAttribute::new();
        assert_eq!(100.0, attr.base());
        assert_eq!(100.0, attr.current());
        assert_eq!(100.0, attr.max());
    }

    #[test]
    fn over_max_clamps_without_notifying() {
        let (mut attr, seen) = recording();
        assert_eq!(None, attr.set_current(150.0).unwrap());
        assert_eq!(100.0, attr.current());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn below_zero_clamps_and_notifies() {
        let (mut attr, seen) = recording();
        let change = attr.set_current(-20.0).unwrap().unwrap();
        assert_eq!(0.0, attr.current());
        assert_eq!(-100.0, change.delta());
        assert_eq!(vec![(100.0, 0.0)], *seen.lock().unwrap());
    }

    #[test]
    fn lowering_max_reclamps_current() {
        let (mut attr, seen) = recording();
        attr.set_max(50.0).unwrap();
        assert_eq!(50.0, attr.current());
        assert_eq!(vec![(100.0, 50.0)], *seen.lock().unwrap());
    }

    #[test]
    fn negative_zero_lands_on_positive_zero() {
        let (mut attr, seen) = recording();
        let change = attr.set_current(-0.0).unwrap().unwrap();
        assert!(attr.current().is_sign_positive());
        assert!(change.new.is_sign_positive());
        assert_eq!(vec![(100.0, 0.0)], *seen.lock().unwrap());

        // Already at zero: a second negative zero is not a change.
        assert_eq!(None, attr.set_current(-0.0).unwrap());
        assert_eq!(1, seen.lock().unwrap().len());
    }

    #[test]
    fn zero_max_pins_current_to_zero() {
        let (mut attr, seen) = recording();
        attr.set_max(-0.0).unwrap();
        assert!(attr.max().is_sign_positive());
        assert_eq!(0.0, attr.current());
        assert!(attr.current().is_sign_positive());

        assert_eq!(None, attr.set_current(50.0).unwrap());
        attr.set_max(0.0).unwrap();
        assert_eq!(vec![(100.0, 0.0)], *seen.lock().unwrap());
    }

    #[test]
    fn max_set_after_current_wins() {
        let mut attr = BoundedAttribute::new();
        attr.set_current(30.0).unwrap();
        attr.set_max(20.0).unwrap();
        assert_eq!(20.0, attr.current());
    }

    #[test]
    fn same_value_is_silent() {
        let (mut attr, seen) = recording();
        assert_eq!(None, attr.set_current(100.0).unwrap());
        let current = attr.current();
        attr.set_current(current).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn raising_max_leaves_current_alone() {
        let (mut attr, seen) = recording();
        assert_eq!(None, attr.set_max(250.0).unwrap());
        assert_eq!(100.0, attr.current());
        attr.set_current(180.0).unwrap();
        assert_eq!(180.0, attr.current());
        assert_eq!(vec![(100.0, 180.0)], *seen.lock().unwrap());
    }

    #[test]
    fn negative_max_is_rejected() {
        let mut attr = BoundedAttribute::new();
        let err = attr.set_max(-1.0).unwrap_err();
        assert!(matches!(
            err,
            AttributeError::InvalidArgument { field: "max", .. }
        ));
        assert_eq!(100.0, attr.max());
    }

    #[test]
    fn non_finite_input() {
        let mut attr = BoundedAttribute::new();
        assert!(attr.set_max(f32::NAN).is_err());
        assert!(attr.set_max(f32::INFINITY).is_err());
        assert!(attr.set_current(f32::NAN).is_err());
        assert_eq!(100.0, attr.current());

        attr.set_current(f32::NEG_INFINITY).unwrap();
        assert_eq!(0.0, attr.current());
        attr.set_current(f32::INFINITY).unwrap();
        assert_eq!(100.0, attr.current());
    }

    #[test]
    fn replacing_observer_drops_the_old_one() {
        let (mut attr, first) = recording();
        let second = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&second);
        attr.register_observer(Box::new(move |_, _| {
            *counter.lock().unwrap() += 1;
        }));
        attr.set_current(10.0).unwrap();
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(1, *second.lock().unwrap());

        attr.clear_observer();
        assert!(!attr.has_observer());
        attr.set_current(20.0).unwrap();
        assert_eq!(1, *second.lock().unwrap());
    }

    #[test]
    fn base_is_clamped_and_silent() {
        let (mut attr, seen) = recording();
        assert_eq!(100.0, attr.set_base(400.0).unwrap());
        assert_eq!(0.0, attr.set_base(-3.0).unwrap());
        assert!(attr.set_base(f32::NAN).is_err());
        assert!(seen.lock().unwrap().is_empty());
    }
}
