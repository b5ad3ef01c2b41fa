// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Thread-local slots for per-stimulus data.
//!
//! Stimulus sources that are not plain emits (fd readiness, clock ticks) have data that
//! belongs to one task construction, not to the typed cache: the next readiness event
//! for the same fd must not see the previous one. The dispatching thread places the
//! payload here with [`scoped`], builds the task (whose argument fetch reads the slot
//! with [`current`]), and the slot is cleared when the scope exits - including on
//! unwind.

use std::{any::{Any, TypeId}, cell::RefCell, collections::HashMap};

thread_local! {
    static SLOTS: RefCell<HashMap<TypeId, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Runs `f` with `value` readable via [`current::<T>()`] on this thread.
///
/// The slot is removed when `f` returns or panics. Nested scopes of the same type
/// shadow and then clear; the runtime never nests them.
pub fn scoped<T: 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    SLOTS.with(|slots| {
        slots.borrow_mut().insert(TypeId::of::<T>(), Box::new(value));
    });
    let _clear = ClearOnDrop(TypeId::of::<T>());
    f()
}

/// The value placed by the innermost live [`scoped::<T>`] on this thread, if any.
#[must_use]
pub fn current<T: Clone + 'static>() -> Option<T> {
    SLOTS.with(|slots| {
        slots
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    })
}

struct ClearOnDrop(TypeId);

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        SLOTS.with(|slots| {
            slots.borrow_mut().remove(&self.0);
        });
    }
}
