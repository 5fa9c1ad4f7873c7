//! Bounded FIFO of producer-tagged payloads. Does not itself enforce
//! mutual exclusion; callers are expected to guard access with semaphores,
//! as in the classic bounded-buffer protocol.

use std::collections::VecDeque;

use crate::process::Pid;

#[derive(Debug)]
pub struct SharedBuffer {
    capacity: usize,
    items: VecDeque<(Pid, String)>,
}

impl SharedBuffer {
    pub fn new(capacity: usize) -> Self {
        SharedBuffer {
            capacity,
            items: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn write(&mut self, pid: Pid, payload: impl Into<String>) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push_back((pid, payload.into()));
        true
    }

    pub fn read(&mut self) -> Option<(Pid, String)> {
        self.items.pop_front()
    }
}
