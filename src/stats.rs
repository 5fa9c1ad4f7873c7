//! Simulation-wide counters, separated out of `Kernel` so `snapshot()` has
//! one coherent struct to hand to a display layer.

use crate::process::Process;

#[derive(Debug, Default, Clone)]
pub struct Statistics {
    pub total_processes: u64,
    pub completed_processes: u64,
    pub rejected_processes: u64,
    pub forced_terminations: u64,

    pub total_page_faults: u64,
    pub memory_accesses: u64,
    pub total_swaps: u64,

    pub avg_waiting_time: f64,
    pub avg_turnaround_time: f64,

    pub deadlocks_detected: u64,
    pub total_blocks: u64,
}

impl Statistics {
    /// `total_page_faults / memory_accesses`, or 0 when nothing has been
    /// accessed yet (spec.md §4.6).
    pub fn page_fault_rate(&self) -> f64 {
        if self.memory_accesses == 0 {
            0.0
        } else {
            self.total_page_faults as f64 / self.memory_accesses as f64
        }
    }

    /// Recomputes the average waiting/turnaround time across every
    /// terminated process. O(n) in the number of process records; called
    /// on demand by `snapshot()` rather than kept incrementally, since
    /// it's only ever needed for a point-in-time report.
    pub fn calculate_cpu_metrics<'a>(&mut self, processes: impl Iterator<Item = &'a Process>) {
        let finished: Vec<&Process> = processes.filter(|p| p.finish_time.is_some()).collect();
        if finished.is_empty() {
            return;
        }

        let count = finished.len() as f64;
        self.avg_waiting_time = finished.iter().map(|p| p.waiting_time as f64).sum::<f64>() / count;
        self.avg_turnaround_time =
            finished.iter().map(|p| p.turnaround_time as f64).sum::<f64>() / count;
    }
}
