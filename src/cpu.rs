//! The single simulated processor.

use crate::process::{Pid, Process, ProcessState};

#[derive(Debug, Default)]
pub struct Cpu {
    current: Option<Pid>,
    ever_assigned: bool,
    busy_time: u64,
    idle_time: u64,
    context_switches: u64,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu::default()
    }

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    pub fn is_free(&self) -> bool {
        self.current.is_none()
    }

    pub fn busy_time(&self) -> u64 {
        self.busy_time
    }

    pub fn idle_time(&self) -> u64 {
        self.idle_time
    }

    pub fn context_switches(&self) -> u64 {
        self.context_switches
    }

    pub fn utilization(&self) -> f64 {
        let total = self.busy_time + self.idle_time;
        if total == 0 {
            0.0
        } else {
            self.busy_time as f64 / total as f64 * 100.0
        }
    }

    /// Dispatches `process` onto the CPU. Counts a context switch for
    /// every dispatch after the first. The CPU having gone idle between
    /// the two does not make the handoff free, so this counts "has
    /// anything run before" rather than "is something current right now"
    /// (a terminate-then-dispatch handoff still counts as one switch).
    /// Stamps `start_time` the first time a process is ever dispatched.
    pub fn assign(&mut self, process: &mut Process, now: u64) {
        if self.ever_assigned {
            self.context_switches += 1;
        }
        self.ever_assigned = true;
        self.current = Some(process.pid);
        process.state = ProcessState::Running;
        if process.start_time.is_none() {
            process.start_time = Some(now);
        }
    }

    /// Releases the CPU, returning the previously-current process to
    /// `Ready`. Does not enqueue it in the scheduler; that is the
    /// Kernel's job, since `Cpu` holds only a weak `Pid` reference.
    pub fn release(&mut self, process: Option<&mut Process>) {
        if self.current.is_some() {
            if let Some(process) = process {
                process.state = ProcessState::Ready;
            }
        }
        self.current = None;
    }

    /// Clears `current` without touching the process's state, for the
    /// caller that has already moved the process to some other state
    /// itself (e.g. `Semaphore::wait` moving it straight to `Blocked`) and
    /// would otherwise have `release` stomp that back to `Ready`.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Executes one cycle: decrements the running process's remaining CPU
    /// burst, or counts an idle tick if nothing is running.
    pub fn execute_cycle(&mut self, process: Option<&mut Process>) {
        match process {
            Some(process) => {
                process.remaining_cpu -= 1;
                self.busy_time += 1;
            }
            None => self.idle_time += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_sets_start_time_once() {
        let mut cpu = Cpu::new();
        let mut p = Process::new(Pid(1), 4, 10, 5, None, 0);
        cpu.assign(&mut p, 7);
        assert_eq!(p.start_time, Some(7));
        cpu.release(Some(&mut p));
        cpu.assign(&mut p, 20);
        assert_eq!(p.start_time, Some(7));
    }

    #[test]
    fn context_switches_count_only_when_preempting_another_process() {
        let mut cpu = Cpu::new();
        let mut p1 = Process::new(Pid(1), 4, 10, 5, None, 0);
        let mut p2 = Process::new(Pid(2), 4, 10, 5, None, 0);

        cpu.assign(&mut p1, 0);
        assert_eq!(cpu.context_switches(), 0);
        cpu.assign(&mut p2, 1);
        assert_eq!(cpu.context_switches(), 1);
    }

    #[test]
    fn utilization_is_zero_with_no_ticks() {
        assert_eq!(Cpu::new().utilization(), 0.0);
    }

    #[test]
    fn idle_cycle_counts_idle_time() {
        let mut cpu = Cpu::new();
        cpu.execute_cycle(None);
        cpu.execute_cycle(None);
        assert_eq!(cpu.idle_time(), 2);
        assert_eq!(cpu.utilization(), 0.0);
    }
}
