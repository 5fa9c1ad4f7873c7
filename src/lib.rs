//! Discrete-time operating-system kernel simulator.
//!
//! The core (`kernel`, `process`, `page_table`, `memory`, `scheduler`,
//! `cpu`, `semaphore`, `buffer`, `stats`) jointly models process lifecycle
//! and scheduling on a single CPU, paged virtual memory with LRU swapping,
//! and counting-semaphore synchronization over a bounded shared buffer.
//! `config`, `error`, and `logging` are the ambient surface a driver needs
//! to actually run it.

pub mod buffer;
pub mod config;
pub mod cpu;
pub mod demos;
pub mod error;
pub mod kernel;
pub mod logging;
pub mod memory;
pub mod page_table;
pub mod process;
pub mod scheduler;
pub mod semaphore;
pub mod stats;

pub use config::SimConfig;
pub use error::ConfigError;
pub use kernel::{Kernel, Snapshot};
pub use process::{Pid, Process, ProcessState, TerminationCause};
