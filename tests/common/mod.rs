//! Shared test fixtures.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use transfer_api::TransferVariant;

/// A variant over plain strings, enough to exercise every storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringVariant(Option<String>);

impl StringVariant {
    pub fn of(name: &str) -> Self {
        StringVariant(Some(name.to_string()))
    }
}

impl TransferVariant for StringVariant {
    type Object = String;

    fn blank() -> Self {
        StringVariant(None)
    }

    fn is_blank(&self) -> bool {
        self.0.is_none()
    }

    fn object(&self) -> Option<&String> {
        self.0.as_ref()
    }
}

pub fn hello() -> StringVariant {
    StringVariant::of("hello")
}

pub fn world() -> StringVariant {
    StringVariant::of("world")
}

/// A shared counter and a hook that increments it, for final-commit tests.
pub fn counter_hook() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let counter = Rc::new(Cell::new(0));
    let hook_counter = Rc::clone(&counter);
    (counter, move || hook_counter.set(hook_counter.get() + 1))
}

/// Install a tracing subscriber reading `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
