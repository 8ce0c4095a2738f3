//! The process runtime.
//!
//! Events are queued from any thread through [`Engine::emit`] or a cloned
//! [`Emitter`] and only take effect when the consuming thread calls
//! [`Engine::update`]. Update drains the queue in order; for each event every
//! active process waiting on it fires (not just the first), its output label's
//! callback runs with the event's blackboard handle, and non recursive
//! processes hand over to their successors once the event has been seen by
//! all of them.
//!
//! Binding, loading and updating share one lock, so the callback set and the
//! table cannot change halfway through a dispatch. Callbacks run while that
//! lock is held: they may emit, take from the blackboard and commit to a
//! journal, but must not bind, unbind or load on the same engine.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

// labels are short strings, so a fast non-cryptographic hash does fine
use seahash::SeaHasher;
use tracing::{debug, trace};

use crate::blackboard::{Blackboard, Handle, NO_PAYLOAD};
use crate::datatype::TypedCell;
use crate::error::Result;
use crate::guard;
use crate::journal::JournalEntry;
use crate::process::{ProcessState, ProcessTable};

pub type LabelHasher = BuildHasherDefault<SeaHasher>;

type Callback = Box<dyn FnMut(Handle) + Send>;

/// A named occurrence, with the blackboard handle of its payload or
/// [`NO_PAYLOAD`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub handle: Handle,
}

struct Dispatch {
    table: ProcessTable,
    bindings: HashMap<String, Callback, LabelHasher>,
    events: Receiver<Event>,
}

/// Producer side of an engine, cheap to clone into other threads.
#[derive(Debug, Clone)]
pub struct Emitter {
    sender: Sender<Event>,
    blackboard: Arc<Blackboard>,
}

impl Emitter {
    /// Queues an event. Never blocks, and silently does nothing once the
    /// engine is gone.
    pub fn emit(&self, name: &str, handle: Handle) {
        if self.sender.send(Event { name: name.to_string(), handle }).is_err() {
            trace!(event = name, "engine gone, event discarded");
        }
    }
    /// Puts `cell` on the blackboard and queues an event carrying its handle.
    pub fn emit_with(&self, name: &str, cell: TypedCell) -> Handle {
        let handle = self.blackboard.put(cell);
        self.emit(name, handle);
        handle
    }
    pub fn blackboard(&self) -> &Arc<Blackboard> {
        &self.blackboard
    }
}

pub struct Engine {
    dispatch: Mutex<Dispatch>,
    emitter: Emitter,
}

impl Engine {
    pub fn new(table: ProcessTable) -> Self {
        Self::with_blackboard(table, Arc::new(Blackboard::new()))
    }
    pub fn with_blackboard(table: ProcessTable, blackboard: Arc<Blackboard>) -> Self {
        let (sender, events) = mpsc::channel();
        Self {
            dispatch: Mutex::new(Dispatch {
                table,
                bindings: HashMap::default(),
                events,
            }),
            emitter: Emitter { sender, blackboard },
        }
    }
    /// Parses a script into a fresh engine.
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self::new(ProcessTable::parse(source)?))
    }
    /// Merges further definitions into the running table. On a parse error the
    /// table is left exactly as it was.
    pub fn load(&self, source: &str) -> Result<usize> {
        guard(&self.dispatch).table.merge(source)
    }

    pub fn bind(&self, label: &str, callback: impl FnMut(Handle) + Send + 'static) {
        debug!(label, "binding callback");
        guard(&self.dispatch).bindings.insert(label.to_string(), Box::new(callback));
    }
    pub fn unbind(&self, label: &str) -> bool {
        guard(&self.dispatch).bindings.remove(label).is_some()
    }

    pub fn emit(&self, name: &str, handle: Handle) {
        self.emitter.emit(name, handle);
    }
    pub fn emit_with(&self, name: &str, cell: TypedCell) -> Handle {
        self.emitter.emit_with(name, cell)
    }
    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }

    pub fn blackboard(&self) -> &Arc<Blackboard> {
        &self.emitter.blackboard
    }
    pub fn put(&self, cell: TypedCell) -> Handle {
        self.emitter.blackboard.put(cell)
    }
    pub fn take(&self, handle: Handle) -> Option<TypedCell> {
        self.emitter.blackboard.take(handle)
    }

    /// Drains the event queue, dispatching each event in arrival order.
    /// Events emitted by callbacks during the drain are handled in the same
    /// call. Returns the number of events consumed.
    pub fn update(&self) -> usize {
        let mut dispatch = guard(&self.dispatch);
        let Dispatch { table, bindings, events } = &mut *dispatch;
        let mut consumed = 0;
        while let Ok(event) = events.try_recv() {
            consumed += 1;
            let fired = table.dispatch(&event.name, |process| {
                if process.out().is_empty() {
                    return;
                }
                match bindings.get_mut(process.out()) {
                    Some(callback) => {
                        trace!(process = process.name(), label = process.out(), handle = event.handle, "firing");
                        callback(event.handle);
                    }
                    None => trace!(process = process.name(), label = process.out(), "no binding"),
                }
            });
            if fired == 0 {
                trace!(event = %event.name, "no active process, event dropped");
            }
        }
        consumed
    }

    /// Re-emits journal entries in order, putting their payloads on the
    /// blackboard.
    pub fn replay(&self, entries: impl IntoIterator<Item = JournalEntry>) -> usize {
        let mut replayed = 0;
        for entry in entries {
            let handle = match entry.data {
                Some(cell) => self.put(cell),
                None => NO_PAYLOAD,
            };
            self.emit(&entry.label, handle);
            replayed += 1;
        }
        debug!(replayed, "replayed journal entries");
        replayed
    }

    pub fn state(&self, name: &str) -> Option<ProcessState> {
        guard(&self.dispatch).table.state(name)
    }
    /// A snapshot of the process table and its states.
    pub fn table(&self) -> ProcessTable {
        guard(&self.dispatch).table.clone()
    }
}
