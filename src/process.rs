//! Process records: identity, timing counters, memory footprint, and the
//! state machine that drives every other component.

use std::collections::HashMap;

/// Monotonically-assigned process handle. Never reused, even after the
/// process it names has terminated. The counter backing it is a plain
/// `Kernel` field rather than a process-wide atomic, since the core is
/// single-threaded and cooperative: there is never more than one caller
/// advancing it at a time.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Pid(pub u64);

impl std::fmt::Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Closed state machine. Illegal transitions (e.g. `Terminated` back to
/// `Ready`) are simply never produced by `Kernel` methods, per the "tagged
/// state machine" design note.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Blocked,
    Waiting,
    Terminated,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TerminationCause {
    Completed,
    Forced,
    Error,
    Deadlock,
    Timeout,
}

impl std::fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TerminationCause::Completed => "COMPLETED",
            TerminationCause::Forced => "FORCED",
            TerminationCause::Error => "ERROR",
            TerminationCause::Deadlock => "DEADLOCK",
            TerminationCause::Timeout => "TIMEOUT",
        };
        write!(f, "{name}")
    }
}

/// What a `Blocked` process is blocked on. A variant rather than a
/// sentinel string, so a typo can't silently desync driver and core.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BlockedOn {
    Semaphore(String),
    Suspended,
}

#[derive(Debug)]
pub struct Process {
    pub pid: Pid,
    pub size_kb: u32,
    pub num_pages: u32,
    pub priority: u8,

    pub cpu_burst: u32,
    pub remaining_cpu: i64,
    pub lifetime: u32,
    pub remaining_lifetime: i64,

    pub arrival_time: u64,
    pub start_time: Option<u64>,
    pub finish_time: Option<u64>,
    pub waiting_time: u64,
    pub turnaround_time: u64,

    pub pages_in_ram: std::collections::BTreeSet<u32>,
    pub pages_in_swap: std::collections::BTreeSet<u32>,
    pub last_access_time: HashMap<u32, u64>,
    pub page_faults: u64,

    pub blocked_on: Option<BlockedOn>,
    pub state: ProcessState,
    pub termination_cause: Option<TerminationCause>,
}

impl Process {
    pub(crate) fn new(
        pid: Pid,
        size_kb: u32,
        lifetime: u32,
        priority: u8,
        cpu_burst: Option<u32>,
        arrival_time: u64,
    ) -> Self {
        let cpu_burst = cpu_burst.unwrap_or(lifetime);

        Process {
            pid,
            size_kb,
            num_pages: 0,
            priority,
            cpu_burst,
            remaining_cpu: cpu_burst as i64,
            lifetime,
            remaining_lifetime: lifetime as i64,
            arrival_time,
            start_time: None,
            finish_time: None,
            waiting_time: 0,
            turnaround_time: 0,
            pages_in_ram: Default::default(),
            pages_in_swap: Default::default(),
            last_access_time: HashMap::new(),
            page_faults: 0,
            blocked_on: None,
            state: ProcessState::New,
            termination_cause: None,
        }
    }

    /// True for any process that has left `New` but not yet reached
    /// `Terminated`. Used by the deadlock heuristic to size the active
    /// set.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, ProcessState::New | ProcessState::Terminated)
    }
}
