//! The orchestrator. `Kernel` owns every other component and is the only
//! thing outside this module that ever touches a `Process` by value; the
//! scheduler, CPU, semaphores, and waiting/blocked lists hold only `Pid`s,
//! never a cyclic reference back into the process table.
//!
//! Every public method here runs to completion without suspension: a
//! partially-applied `allocate` either fully succeeds or leaves RAM, swap,
//! and page tables exactly as they were.

use std::collections::{HashMap, VecDeque};

use crate::config::SimConfig;
use crate::cpu::Cpu;
use crate::memory::{AccessOutcome, MemoryManager};
use crate::process::{BlockedOn, Pid, Process, ProcessState, TerminationCause};
use crate::scheduler::Scheduler;
use crate::semaphore::Semaphore;
use crate::buffer::SharedBuffer;
use crate::stats::Statistics;

/// A point-in-time read-out of simulator state, for a display layer:
/// cpu, ram, swap, scheduler queue lengths, and running stats.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub now: u64,
    pub cpu_current: Option<Pid>,
    pub cpu_utilization: f64,
    pub context_switches: u64,
    pub ram_used: usize,
    pub ram_capacity: usize,
    pub ram_utilization: f64,
    pub swap_used: usize,
    pub swap_capacity: usize,
    pub swap_utilization: f64,
    pub ready_queue_len: usize,
    pub waiting_queue_len: usize,
    pub blocked_len: usize,
    pub stats: Statistics,
}

pub struct Kernel {
    now: u64,
    next_pid: u64,
    processes: HashMap<Pid, Process>,
    memory: MemoryManager,
    scheduler: Scheduler,
    cpu: Cpu,
    semaphores: HashMap<String, Semaphore>,
    buffers: HashMap<String, SharedBuffer>,
    /// Processes admissible in principle but for which neither RAM nor swap
    /// currently has room; retried in FIFO order whenever either is freed.
    waiting_queue: VecDeque<Pid>,
    /// Processes suspended via `suspend()` (`blocked_on = Suspended`).
    blocked_list: Vec<Pid>,
    stats: Statistics,
}

impl Kernel {
    pub fn new(config: &SimConfig) -> Self {
        let memory = MemoryManager::new(
            config.memory.ram_kb,
            config.memory.swap_kb,
            config.memory.page_kb,
        );

        let kernel = Kernel {
            now: 0,
            next_pid: 1,
            processes: HashMap::new(),
            memory,
            scheduler: Scheduler::new(),
            cpu: Cpu::new(),
            semaphores: HashMap::new(),
            buffers: HashMap::new(),
            waiting_queue: VecDeque::new(),
            blocked_list: Vec::new(),
            stats: Statistics::default(),
        };

        kernel.log_event(&format!(
            "SIMULATOR_STARTED ram_kb={} swap_kb={} page_kb={}",
            config.memory.ram_kb, config.memory.swap_kb, config.memory.page_kb
        ));
        kernel
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    fn log_event(&self, text: &str) {
        log::info!("{} | {}", self.now, text);
    }

    // ---- process creation & admission --------------------------------

    pub fn create(
        &mut self,
        size_kb: u32,
        lifetime: u32,
        priority: u8,
        cpu_burst: Option<u32>,
    ) -> Pid {
        let pid = Pid(self.next_pid);
        self.next_pid += 1;

        let process = Process::new(pid, size_kb, lifetime, priority, cpu_burst, self.now);
        self.processes.insert(pid, process);
        self.stats.total_processes += 1;

        self.log_event(&format!(
            "PROCESS_CREATED {pid} size={size_kb}KB lifetime={lifetime} priority={priority}"
        ));
        pid
    }

    /// Tries, in order: oversized rejection, direct install when RAM has
    /// room, eviction when swap can absorb the shortfall, or a WAITING
    /// enqueue when it cannot.
    pub fn allocate(&mut self, pid: Pid) -> bool {
        let Some(size_kb) = self.processes.get(&pid).map(|p| p.size_kb) else {
            return false;
        };

        let ram_kb = self.memory.ram_kb();
        let swap_kb = self.memory.swap_kb();
        if size_kb > ram_kb + swap_kb {
            if let Some(process) = self.processes.get_mut(&pid) {
                process.state = ProcessState::Terminated;
                process.termination_cause = Some(TerminationCause::Error);
                process.finish_time = Some(self.now);
            }
            self.stats.rejected_processes += 1;
            self.log_event(&format!(
                "REJECTED {pid} size={size_kb}KB exceeds ram_kb+swap_kb={}",
                ram_kb + swap_kb
            ));
            return false;
        }

        let num_pages = self.memory.num_pages_for(size_kb);
        self.memory.create_page_table(pid, num_pages);
        if let Some(process) = self.processes.get_mut(&pid) {
            process.num_pages = num_pages;
        }

        let free = self.memory.ram_free();
        if free >= num_pages as usize {
            self.memory
                .install_to_ram(&mut self.processes, pid, 0..num_pages, self.now);
            self.admit_ready(pid);
            self.log_event(&format!("ALLOCATED {pid} pages={num_pages}"));
            return true;
        }

        let needed = num_pages as usize - free;
        if self.memory.swap_free() < needed {
            if let Some(process) = self.processes.get_mut(&pid) {
                process.state = ProcessState::Waiting;
            }
            self.waiting_queue.push_back(pid);
            self.log_event(&format!("QUEUED {pid} needs {needed} more frames than available"));
            return false;
        }

        for _ in 0..needed {
            let (victim_pid, victim_page) =
                self.memory.pick_victim_excluding(Some(pid)).unwrap_or_else(|| {
                    panic!(
                        "allocate({pid}): no eviction candidate despite sufficient swap capacity \
                         (invariant violation)"
                    )
                });
            self.memory
                .swap_out(&mut self.processes, victim_pid, victim_page);
            self.log_event(&format!("SWAP_OUT {victim_pid} page={victim_page}"));
        }

        self.memory
            .install_to_ram(&mut self.processes, pid, 0..num_pages, self.now);
        self.admit_ready(pid);
        self.log_event(&format!("ALLOCATED {pid} pages={num_pages} after eviction"));
        true
    }

    fn admit_ready(&mut self, pid: Pid) {
        if let Some(process) = self.processes.get_mut(&pid) {
            // `enqueue` only accepts New/Ready; a process retried out of
            // the waiting queue arrives here as Waiting.
            process.state = ProcessState::Ready;
            self.scheduler.enqueue(process);
        }
    }

    /// Re-attempts every WAITING process in FIFO order; each retry is a
    /// full `allocate` call, so a process that still doesn't fit is simply
    /// re-queued in its original relative order. Called whenever RAM or
    /// swap capacity is released.
    fn retry_waiting(&mut self) {
        let pending: Vec<Pid> = self.waiting_queue.drain(..).collect();
        for pid in pending {
            self.allocate(pid);
        }
    }

    // ---- page access ---------------------------------------------------

    pub fn access_page(&mut self, pid: Pid, page: u32) {
        let outcome = self.memory.access_page(&mut self.processes, pid, page, self.now);
        if let AccessOutcome::FaultSwapIn { evicted } = outcome {
            if let Some((victim_pid, victim_page)) = evicted {
                self.log_event(&format!("SWAP_OUT {victim_pid} page={victim_page}"));
            }
            self.log_event(&format!("SWAP_IN {pid} page={page}"));
        }
        self.retry_waiting();
    }

    // ---- lifecycle commands ---------------------------------------------

    pub fn suspend(&mut self, pid: Pid) {
        let was_running = matches!(self.processes.get(&pid), Some(p) if p.state == ProcessState::Running);
        let Some(process) = self.processes.get_mut(&pid) else {
            return;
        };
        if process.state == ProcessState::Terminated {
            return;
        }

        if was_running {
            self.cpu.release(self.processes.get_mut(&pid));
        }

        let process = self.processes.get_mut(&pid).unwrap();
        process.state = ProcessState::Blocked;
        process.blocked_on = Some(BlockedOn::Suspended);
        self.scheduler.remove(pid);
        self.blocked_list.push(pid);
        self.log_event(&format!("SUSPENDED {pid}"));
    }

    pub fn resume(&mut self, pid: Pid) {
        let Some(process) = self.processes.get_mut(&pid) else {
            return;
        };
        if !matches!(process.blocked_on, Some(BlockedOn::Suspended)) {
            return;
        }

        process.blocked_on = None;
        process.state = ProcessState::Ready;
        self.scheduler.enqueue(process);
        self.blocked_list.retain(|&queued| queued != pid);
        self.log_event(&format!("RESUMED {pid}"));
    }

    pub fn force_terminate(&mut self, pid: Pid, cause: TerminationCause) {
        if !self.processes.contains_key(&pid) {
            return;
        }

        if self.cpu.current() == Some(pid) {
            self.cpu.release(self.processes.get_mut(&pid));
        }

        self.scheduler.remove(pid);
        self.blocked_list.retain(|&queued| queued != pid);
        self.waiting_queue.retain(|&queued| queued != pid);
        for sem in self.semaphores.values_mut() {
            sem.remove_waiter(pid);
        }

        self.memory.free_process(pid);

        if let Some(process) = self.processes.get_mut(&pid) {
            process.finish_time = Some(self.now);
            if process.start_time.is_some() {
                let turnaround = self.now.saturating_sub(process.arrival_time);
                let executed = process.cpu_burst as i64 - process.remaining_cpu;
                process.turnaround_time = turnaround;
                process.waiting_time = (turnaround as i64 - executed).max(0) as u64;
            }
            process.state = ProcessState::Terminated;
            process.termination_cause = Some(cause);
        }

        // Invariant 7 (`completed + rejected + forced + in-flight =
        // total_processes`) only holds if COMPLETED and FORCED are
        // disjoint buckets; every other cause (ERROR, DEADLOCK, TIMEOUT)
        // rolls up into `forced_terminations` since there is no separate
        // counter for them.
        if cause != TerminationCause::Completed {
            self.stats.forced_terminations += 1;
        }
        self.log_event(&format!("TERMINATED {pid} cause={cause}"));

        self.retry_waiting();
    }

    /// Picks the cause by precedence (exhausted CPU burst beats exhausted
    /// lifetime beats "shouldn't happen" error), then delegates to
    /// `force_terminate`.
    pub fn terminate_normal(&mut self, pid: Pid) {
        let Some(process) = self.processes.get(&pid) else {
            return;
        };

        let cause = if process.remaining_cpu <= 0 {
            TerminationCause::Completed
        } else if process.remaining_lifetime <= 0 {
            TerminationCause::Timeout
        } else {
            TerminationCause::Error
        };

        self.force_terminate(pid, cause);
        if cause == TerminationCause::Completed {
            self.stats.completed_processes += 1;
        }
    }

    // ---- semaphores -------------------------------------------------------

    pub fn create_semaphore(&mut self, name: impl Into<String>, initial_value: i64) {
        let name = name.into();
        self.semaphores
            .insert(name.clone(), Semaphore::new(name.clone(), initial_value));
        self.log_event(&format!("SEM_CREATED {name} value={initial_value}"));
    }

    pub fn semaphore_wait(&mut self, pid: Pid, name: &str) -> bool {
        let Some(sem) = self.semaphores.get_mut(name) else {
            return false;
        };
        let Some(process) = self.processes.get_mut(&pid) else {
            return false;
        };

        let was_running = process.state == ProcessState::Running;
        let proceeded = sem.wait(process);

        if !proceeded {
            self.scheduler.remove(pid);
            if was_running {
                // `sem.wait` already moved the process to `Blocked`;
                // `Cpu::release` would reset it to `Ready`.
                self.cpu.clear();
            }
            self.stats.total_blocks += 1;
            self.log_event(&format!("SEM_WAIT_BLOCK {pid} on {name}"));
        }

        proceeded
    }

    pub fn semaphore_signal(&mut self, pid: Pid, name: &str) {
        let Some(sem) = self.semaphores.get_mut(name) else {
            return;
        };

        if let Some(woken) = sem.signal(&mut self.processes, pid) {
            if let Some(process) = self.processes.get_mut(&woken) {
                self.scheduler.enqueue(process);
            }
            self.log_event(&format!("SEM_SIGNAL_UNBLOCK {pid} unblocks {woken} on {name}"));
        }
    }

    // ---- shared buffers ----------------------------------------------------

    pub fn create_shared_buffer(&mut self, name: impl Into<String>, capacity: usize) {
        self.buffers.insert(name.into(), SharedBuffer::new(capacity));
    }

    pub fn buffer_write(&mut self, name: &str, pid: Pid, payload: impl Into<String>) -> bool {
        self.buffers
            .get_mut(name)
            .map_or(false, |buffer| buffer.write(pid, payload))
    }

    pub fn buffer_read(&mut self, name: &str) -> Option<(Pid, String)> {
        self.buffers.get_mut(name).and_then(|buffer| buffer.read())
    }

    // ---- the tick ----------------------------------------------------

    /// Advances the clock by one and runs the five-step sequence: clock
    /// advance, waiting-time accrual, dispatch, execute, completion-check.
    pub fn tick(&mut self) {
        self.now += 1;

        let ready_pids: Vec<Pid> = self.scheduler.iter().collect();
        for pid in ready_pids {
            if let Some(process) = self.processes.get_mut(&pid) {
                process.waiting_time += 1;
            }
        }

        if self.cpu.is_free() {
            if let Some(pid) = self.scheduler.dequeue() {
                if let Some(process) = self.processes.get_mut(&pid) {
                    self.cpu.assign(process, self.now);
                    self.log_event(&format!("CPU_ASSIGN {pid}"));
                }
            }
        }

        let Some(running) = self.cpu.current() else {
            self.cpu.execute_cycle(None);
            return;
        };

        if let Some(process) = self.processes.get_mut(&running) {
            process.remaining_lifetime -= 1;
        }
        self.cpu.execute_cycle(self.processes.get_mut(&running));

        let finished = self
            .processes
            .get(&running)
            .map_or(false, |p| p.remaining_cpu <= 0);

        if finished {
            self.cpu.release(self.processes.get_mut(&running));
            self.log_event(&format!("CPU_RELEASE {running}"));
            self.terminate_normal(running);
        }
    }

    // ---- deadlock heuristic --------------------------------------------

    /// Global-stall test: not cycle detection, just "everything that could
    /// run is blocked and nothing is runnable". Returns the pids it judges
    /// deadlocked, by value, never an owned `Process`.
    pub fn detect_deadlock(&mut self) -> Vec<Pid> {
        let mut blocked: Vec<Pid> = self.blocked_list.clone();
        for sem in self.semaphores.values() {
            blocked.extend(sem.waiters());
        }

        let active = self.processes.values().filter(|p| p.is_active()).count();

        if !blocked.is_empty()
            && blocked.len() >= active
            && self.scheduler.is_empty()
            && self.cpu.is_free()
        {
            self.stats.deadlocks_detected += 1;
            self.log_event(&format!("DEADLOCK_DETECTED processes={}", blocked.len()));
            blocked
        } else {
            Vec::new()
        }
    }

    // ---- reporting ---------------------------------------------------------

    pub fn snapshot(&mut self) -> Snapshot {
        self.stats.calculate_cpu_metrics(self.processes.values());
        self.sync_memory_stats();

        Snapshot {
            now: self.now,
            cpu_current: self.cpu.current(),
            cpu_utilization: self.cpu.utilization(),
            context_switches: self.cpu.context_switches(),
            ram_used: self.memory.ram_used(),
            ram_capacity: self.memory.ram_capacity(),
            ram_utilization: self.memory.ram_utilization(),
            swap_used: self.memory.swap_used(),
            swap_capacity: self.memory.swap_capacity(),
            swap_utilization: self.memory.swap_utilization(),
            ready_queue_len: self.scheduler.len(),
            waiting_queue_len: self.waiting_queue.len(),
            blocked_len: self.blocked_list.len(),
            stats: self.stats.clone(),
        }
    }

    pub fn finish(&mut self) {
        self.stats.calculate_cpu_metrics(self.processes.values());
        self.sync_memory_stats();
        self.log_event("SIMULATOR_FINISHED");
    }

    /// Mirrors the running counters `MemoryManager` keeps internally into
    /// `Statistics` so a snapshot reflects them without `Kernel` having to
    /// duplicate the increments at every call site.
    fn sync_memory_stats(&mut self) {
        self.stats.total_page_faults = self.memory.total_page_faults();
        self.stats.memory_accesses = self.memory.memory_accesses();
        self.stats.total_swaps = self.memory.total_swaps();
    }
}
