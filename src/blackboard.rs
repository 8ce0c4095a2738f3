//! Thread safe, one shot handoff of typed values between threads.
//!
//! A producer puts a [`TypedCell`] and gets a [`Handle`] back, which it can
//! send along with an event. Whoever takes the handle owns the cell; the entry
//! is gone afterwards and the handle is never handed out again.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::Mutex;

// handles are small integers, so a fast non-cryptographic hash does fine
use seahash::SeaHasher;
use tracing::trace;

use crate::datatype::TypedCell;
use crate::guard;

pub type Handle = u64;
pub type HandleHasher = BuildHasherDefault<SeaHasher>;

/// Carried by events that have no payload.
pub const NO_PAYLOAD: Handle = 0;

#[derive(Debug)]
struct Board {
    next_handle: Handle,
    values: HashMap<Handle, TypedCell, HandleHasher>,
}

#[derive(Debug)]
pub struct Blackboard {
    board: Mutex<Board>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self {
            board: Mutex::new(Board {
                next_handle: NO_PAYLOAD + 1,
                values: HashMap::default(),
            }),
        }
    }
    /// Stores `cell` and returns the handle it can be taken with.
    pub fn put(&self, cell: TypedCell) -> Handle {
        let mut board = guard(&self.board);
        let handle = board.next_handle;
        board.next_handle += 1;
        trace!(handle, data_type = cell.data_type(), "blackboard put");
        board.values.insert(handle, cell);
        handle
    }
    /// Removes and returns the cell behind `handle`, or `None` if the handle
    /// is unknown or was already taken.
    pub fn take(&self, handle: Handle) -> Option<TypedCell> {
        let taken = guard(&self.board).values.remove(&handle);
        if taken.is_none() {
            trace!(handle, "blackboard miss");
        }
        taken
    }
    pub fn len(&self) -> usize {
        guard(&self.board).values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new()
    }
}
