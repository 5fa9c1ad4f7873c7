//! Counting semaphore with a FIFO wait queue and an append-only event log
//! for audit.

use std::collections::VecDeque;

use crate::process::{BlockedOn, Pid, Process, ProcessState};

#[derive(Debug)]
pub struct Semaphore {
    name: String,
    value: i64,
    wait_queue: VecDeque<Pid>,
    history: Vec<String>,
}

impl Semaphore {
    pub fn new(name: impl Into<String>, initial_value: i64) -> Self {
        Semaphore {
            name: name.into(),
            value: initial_value,
            wait_queue: VecDeque::new(),
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn wait_queue_len(&self) -> usize {
        self.wait_queue.len()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// P operation. Returns `true` if the caller may proceed immediately,
    /// `false` if it was blocked and appended to the wait queue, in which
    /// case the Kernel must dequeue it from the scheduler and, if it was
    /// `Running`, release the CPU.
    pub fn wait(&mut self, process: &mut Process) -> bool {
        self.value -= 1;
        if self.value < 0 {
            process.state = ProcessState::Blocked;
            process.blocked_on = Some(BlockedOn::Semaphore(self.name.clone()));
            self.wait_queue.push_back(process.pid);
            self.history.push(format!("{} blocked on {}", process.pid, self.name));
            false
        } else {
            self.history.push(format!("{} acquired {}", process.pid, self.name));
            true
        }
    }

    /// V operation. Returns the pid of the process unblocked from the head
    /// of the wait queue, if any. The Kernel must re-enqueue it into the
    /// scheduler. The signaling process's pid is used only for the audit
    /// log when nobody was waiting.
    pub fn signal(&mut self, processes: &mut std::collections::HashMap<Pid, Process>, signaller: Pid) -> Option<Pid> {
        self.value += 1;

        if let Some(woken) = self.wait_queue.pop_front() {
            if let Some(process) = processes.get_mut(&woken) {
                process.state = ProcessState::Ready;
                process.blocked_on = None;
            }
            self.history.push(format!("{} unblocked from {}", woken, self.name));
            Some(woken)
        } else {
            self.history.push(format!("{} released {}", signaller, self.name));
            None
        }
    }

    pub fn remove_waiter(&mut self, pid: Pid) {
        self.wait_queue.retain(|&queued| queued != pid);
    }

    pub fn waiters(&self) -> impl Iterator<Item = Pid> + '_ {
        self.wait_queue.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn initial_zero_blocks_first_waiter() {
        let mut sem = Semaphore::new("full", 0);
        let mut p = Process::new(Pid(1), 4, 10, 5, None, 0);
        assert!(!sem.wait(&mut p));
        assert_eq!(p.state, ProcessState::Blocked);
        assert_eq!(sem.value(), -1);
    }

    #[test]
    fn n_signals_unblock_n_waiters_in_arrival_order() {
        let mut sem = Semaphore::new("full", 0);
        let mut processes = HashMap::new();
        for pid in 1..=3u64 {
            let mut p = Process::new(Pid(pid), 4, 10, 5, None, 0);
            sem.wait(&mut p);
            processes.insert(Pid(pid), p);
        }

        let mut unblocked = vec![];
        for _ in 0..3 {
            unblocked.push(sem.signal(&mut processes, Pid(0)).unwrap());
        }
        assert_eq!(unblocked, vec![Pid(1), Pid(2), Pid(3)]);
        assert_eq!(sem.value(), 2);
    }

    #[test]
    fn wait_then_signal_on_value_one_round_trips() {
        let mut sem = Semaphore::new("mutex", 1);
        let mut processes = HashMap::new();
        let mut p = Process::new(Pid(1), 4, 10, 5, None, 0);
        assert!(sem.wait(&mut p));
        processes.insert(Pid(1), p);
        assert!(sem.signal(&mut processes, Pid(1)).is_none());
        assert_eq!(sem.value(), 1);
        assert_eq!(sem.wait_queue_len(), 0);
    }
}
