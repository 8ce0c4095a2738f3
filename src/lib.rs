//! csplab – a small process algebra runtime for driving application behavior
//! from named events.
//!
//! Behavior is declared in a tiny CSP flavored script:
//!
//! ```text
//! CLOCK  = (tick -> CLOCK "ticked")
//! CLOCK2 = (tick -> (tock -> CLOCK2 "tocked") "ticked")
//! ```
//!
//! Each definition is a *process* that waits for one event, optionally fires
//! an output label, and then becomes its successor behavior. A process naming
//! itself stays put; a parenthesized successor becomes an anonymous process
//! that is only reachable by transition. Naming a process that does not exist
//! (conventionally `STOP`) ends that branch.
//!
//! ## Modules
//! * [`scan`] – Cursor style scanning primitives the parser is built on.
//! * [`process`] – Process records, their activation states and the script parser.
//! * [`engine`] – The runtime: a multi producer event queue, callback bindings
//!   keyed by output label, and the single consumer [`engine::Engine::update`] step.
//! * [`datatype`] – The [`datatype::DataType`] trait and the type erased
//!   [`datatype::TypedCell`] used as payload.
//! * [`blackboard`] – One shot handle to cell storage for passing payloads
//!   between threads.
//! * [`journal`] – Linear undo/redo history of reversible transactions, with a
//!   line oriented dump that can be replayed as events.
//! * [`calculator`] – A journaled stack calculator wired up through all of the above.
//! * [`settings`] – Configuration for the driver binary.
//!
//! ## Threading
//! Any thread may [`engine::Engine::emit`] events and put cells on the
//! blackboard. Exactly one thread, typically the one refreshing the UI, calls
//! [`engine::Engine::update`], which is where bound callbacks run. Callbacks may
//! take from the blackboard and commit to a journal, never the other way
//! around, and must not bind or load into the engine that is calling them.
//!
//! ## Quick Start
//! ```
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//! use csplab::engine::Engine;
//! use csplab::blackboard::NO_PAYLOAD;
//!
//! let engine = Engine::parse("CLOCK = (tick -> CLOCK \"ticked\")").unwrap();
//! let ticks = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&ticks);
//! engine.bind("ticked", move |_| { counter.fetch_add(1, Ordering::SeqCst); });
//! engine.emit("tick", NO_PAYLOAD);
//! engine.emit("tick", NO_PAYLOAD);
//! engine.update();
//! assert_eq!(ticks.load(Ordering::SeqCst), 2);
//! ```

pub mod blackboard;
pub mod calculator;
pub mod datatype;
pub mod engine;
pub mod error;
pub mod journal;
pub mod process;
pub mod scan;
pub mod settings;

pub use error::{CspError, Result};

use std::sync::{Mutex, MutexGuard};

// Poisoned locks are recovered, not propagated.
pub(crate) fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("recovering poisoned lock");
        poisoned.into_inner()
    })
}
