//! Non-preemptive first-come-first-served scheduler.

use std::collections::VecDeque;

use crate::process::{Pid, Process, ProcessState};

#[derive(Debug, Default)]
pub struct Scheduler {
    ready_queue: VecDeque<Pid>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            ready_queue: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ready_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready_queue.is_empty()
    }

    pub fn has_processes(&self) -> bool {
        !self.is_empty()
    }

    /// Appends `process` iff its state is `New` or `Ready`, setting it to
    /// `Ready`. Any other state is a caller error and is silently ignored;
    /// the Kernel is responsible for only calling this on processes
    /// leaving `Running`, `Blocked`, or `Waiting`.
    pub fn enqueue(&mut self, process: &mut Process) {
        if matches!(process.state, ProcessState::New | ProcessState::Ready) {
            process.state = ProcessState::Ready;
            self.ready_queue.push_back(process.pid);
        }
    }

    pub fn dequeue(&mut self) -> Option<Pid> {
        self.ready_queue.pop_front()
    }

    /// Non-preemptive: there is never a reason to interrupt the running
    /// process early.
    pub fn should_preempt(&self) -> bool {
        false
    }

    /// Removes `pid` from the ready queue if present, O(n) scan.
    pub fn remove(&mut self, pid: Pid) {
        self.ready_queue.retain(|&queued| queued != pid);
    }

    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.ready_queue.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_process(pid: u64) -> Process {
        let mut p = Process::new(Pid(pid), 4, 10, 5, None, 0);
        p.state = ProcessState::Ready;
        p
    }

    #[test]
    fn fifo_order() {
        let mut sched = Scheduler::new();
        let mut p1 = ready_process(1);
        let mut p2 = ready_process(2);
        sched.enqueue(&mut p1);
        sched.enqueue(&mut p2);
        assert_eq!(sched.dequeue(), Some(Pid(1)));
        assert_eq!(sched.dequeue(), Some(Pid(2)));
        assert_eq!(sched.dequeue(), None);
    }

    #[test]
    fn refuses_to_enqueue_running_process() {
        let mut sched = Scheduler::new();
        let mut p = Process::new(Pid(1), 4, 10, 5, None, 0);
        p.state = ProcessState::Running;
        sched.enqueue(&mut p);
        assert!(sched.is_empty());
    }

    #[test]
    fn remove_is_a_no_op_when_absent() {
        let mut sched = Scheduler::new();
        sched.remove(Pid(99));
        assert!(sched.is_empty());
    }

    #[test]
    fn should_preempt_is_always_false() {
        assert!(!Scheduler::new().should_preempt());
    }
}
