//! Admission, RAM allocation, swap-out/swap-in, LRU victim choice, and
//! page-fault accounting: the coupling point between the page table
//! (`crate::page_table`) and the two frame stores (`frame_store`).
//!
//! `MemoryManager` owns every process's `PageTable` as well as RAM and
//! swap; it is handed `&mut` access to the `Process` registry by `Kernel`
//! for the handful of operations that also need to update a process's
//! residency bookkeeping (`pages_in_ram`, `pages_in_swap`,
//! `last_access_time`, `page_faults`), per the "cross-component mutation
//! without cyclic ownership" design note: nothing outside `Kernel` holds an
//! owning reference to a `Process`.

pub mod frame_store;

use std::collections::HashMap;

use crate::page_table::PageTable;
use crate::process::{Pid, Process};
use frame_store::{FrameOwner, FrameStore};

/// What `access_page` did, for the caller's event logging. `Hit` and
/// `NoOp` produce no log event; `FaultSwapIn`/`FaultInstall` distinguish a
/// fault satisfied from swap (which may itself evict another page) from
/// one satisfied by installing a never-loaded page, so the caller doesn't
/// mislabel the latter as a `SWAP_IN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    NoOp,
    Hit,
    FaultSwapIn { evicted: Option<(Pid, u32)> },
    FaultInstall,
}

pub struct MemoryManager {
    page_kb: u32,
    ram: FrameStore,
    swap: FrameStore,
    page_tables: HashMap<Pid, PageTable>,
    total_swaps: u64,
    total_page_faults: u64,
    memory_accesses: u64,
}

impl MemoryManager {
    pub fn new(ram_kb: u32, swap_kb: u32, page_kb: u32) -> Self {
        assert!(page_kb > 0, "page_kb must be nonzero");
        assert_eq!(ram_kb % page_kb, 0, "ram_kb must be a multiple of page_kb");
        assert_eq!(swap_kb % page_kb, 0, "swap_kb must be a multiple of page_kb");

        MemoryManager {
            page_kb,
            ram: FrameStore::new("ram", (ram_kb / page_kb) as usize),
            swap: FrameStore::new("swap", (swap_kb / page_kb) as usize),
            page_tables: HashMap::new(),
            total_swaps: 0,
            total_page_faults: 0,
            memory_accesses: 0,
        }
    }

    pub fn ram_kb(&self) -> u32 {
        self.ram.capacity() as u32 * self.page_kb
    }

    pub fn swap_kb(&self) -> u32 {
        self.swap.capacity() as u32 * self.page_kb
    }

    pub fn page_kb(&self) -> u32 {
        self.page_kb
    }

    pub fn num_pages_for(&self, size_kb: u32) -> u32 {
        (size_kb + self.page_kb - 1) / self.page_kb
    }

    pub fn ram_free(&self) -> usize {
        self.ram.free()
    }

    pub fn swap_free(&self) -> usize {
        self.swap.free()
    }

    pub fn ram_capacity(&self) -> usize {
        self.ram.capacity()
    }

    pub fn ram_used(&self) -> usize {
        self.ram.used()
    }

    pub fn swap_capacity(&self) -> usize {
        self.swap.capacity()
    }

    pub fn swap_used(&self) -> usize {
        self.swap.used()
    }

    pub fn ram_utilization(&self) -> f64 {
        self.ram.utilization()
    }

    pub fn swap_utilization(&self) -> f64 {
        self.swap.utilization()
    }

    pub fn total_swaps(&self) -> u64 {
        self.total_swaps
    }

    pub fn total_page_faults(&self) -> u64 {
        self.total_page_faults
    }

    pub fn memory_accesses(&self) -> u64 {
        self.memory_accesses
    }

    pub fn page_fault_rate(&self) -> f64 {
        if self.memory_accesses == 0 {
            0.0
        } else {
            self.total_page_faults as f64 / self.memory_accesses as f64
        }
    }

    pub fn page_table(&self, pid: Pid) -> Option<&PageTable> {
        self.page_tables.get(&pid)
    }

    /// Builds an empty page table for `pid` with `num_pages` entries. The
    /// caller (`Kernel::allocate`) has already validated that the process
    /// fits within `ram_kb + swap_kb`.
    pub fn create_page_table(&mut self, pid: Pid, num_pages: u32) {
        self.page_tables.insert(pid, PageTable::new(num_pages));
    }

    /// Places each page in `pages` into the lowest-indexed empty RAM frame.
    /// Panics if RAM does not have enough free frames; callers must have
    /// already ensured `pages.len() <= ram_free()`.
    pub fn install_to_ram(
        &mut self,
        processes: &mut HashMap<Pid, Process>,
        pid: Pid,
        pages: impl IntoIterator<Item = u32>,
        now: u64,
    ) {
        for page in pages {
            let frame = self
                .ram
                .lowest_free()
                .expect("install_to_ram called with insufficient free RAM");
            self.ram.occupy(frame, FrameOwner { pid, page });

            let table = self
                .page_tables
                .get_mut(&pid)
                .expect("install_to_ram: process has no page table");
            let entry = table.get_mut(page).expect("page out of range");
            entry.frame = Some(frame);
            entry.swap_loc = None;
            entry.in_ram = true;
            entry.last_access = now;

            if let Some(process) = processes.get_mut(&pid) {
                process.pages_in_swap.remove(&page);
                process.pages_in_ram.insert(page);
                process.last_access_time.insert(page, now);
            }
        }
    }

    /// Scans every resident `(pid, page)` pair across all live page tables
    /// and returns the least-recently-used one, tie-breaking on lowest pid
    /// then lowest page number. Never returns a page belonging to `exclude`
    /// (the process currently being admitted or swapped in), per §4.4.
    pub fn pick_victim_excluding(&self, exclude: Option<Pid>) -> Option<(Pid, u32)> {
        let mut best: Option<(u64, Pid, u32)> = None;

        for (&pid, table) in self.page_tables.iter() {
            if Some(pid) == exclude {
                continue;
            }
            for page in 0..table.num_pages() {
                let entry = table.get(page).unwrap();
                if !entry.in_ram {
                    continue;
                }

                let candidate = (entry.last_access, pid, page);
                best = Some(match best {
                    Some(current) if current <= candidate => current,
                    _ => candidate,
                });
            }
        }

        best.map(|(_, pid, page)| (pid, page))
    }

    /// `pick_victim_excluding(None)`, for callers with no process to spare.
    pub fn pick_victim(&self) -> Option<(Pid, u32)> {
        self.pick_victim_excluding(None)
    }

    /// Evicts `(pid, page)` from RAM to swap. Returns `false` if swap is
    /// full; the caller treats that as fatal for the allocation attempt
    /// in progress.
    pub fn swap_out(&mut self, processes: &mut HashMap<Pid, Process>, pid: Pid, page: u32) -> bool {
        let frame = match self.page_tables.get(&pid).and_then(|t| t.get(page)) {
            Some(entry) if entry.in_ram => entry.frame.expect("in_ram entry without frame"),
            _ => return false,
        };

        let Some(slot) = self.swap.lowest_free() else {
            return false;
        };

        self.swap.occupy(slot, FrameOwner { pid, page });
        self.ram.clear(frame);

        let table = self.page_tables.get_mut(&pid).unwrap();
        let entry = table.get_mut(page).unwrap();
        entry.frame = None;
        entry.swap_loc = Some(slot);
        entry.in_ram = false;

        if let Some(process) = processes.get_mut(&pid) {
            process.pages_in_ram.remove(&page);
            process.pages_in_swap.insert(page);
        }

        self.total_swaps += 1;
        true
    }

    /// Restores `(pid, page)` from swap to RAM, evicting another page via
    /// LRU if RAM is full (never one of `pid`'s own pages, per §4.4/§4.5).
    /// Returns `(success, evicted)`, where `evicted` names the page that
    /// had to be swapped out to make room, if any; the caller uses it to
    /// emit a `SWAP_OUT` event for that eviction. `success` is `false` only
    /// if the page has no swap location at all (programming error by the
    /// caller).
    pub fn swap_in(
        &mut self,
        processes: &mut HashMap<Pid, Process>,
        pid: Pid,
        page: u32,
        now: u64,
    ) -> (bool, Option<(Pid, u32)>) {
        let swap_loc = match self.page_tables.get(&pid).and_then(|t| t.get(page)) {
            Some(entry) => match entry.swap_loc {
                Some(loc) => loc,
                None => return (false, None),
            },
            None => return (false, None),
        };

        let mut evicted = None;
        if self.ram.lowest_free().is_none() {
            if let Some((victim_pid, victim_page)) = self.pick_victim_excluding(Some(pid)) {
                self.swap_out(processes, victim_pid, victim_page);
                evicted = Some((victim_pid, victim_page));
            }
        }

        let Some(frame) = self.ram.lowest_free() else {
            return (false, evicted);
        };

        self.ram.occupy(frame, FrameOwner { pid, page });
        self.swap.clear(swap_loc);

        let table = self.page_tables.get_mut(&pid).unwrap();
        let entry = table.get_mut(page).unwrap();
        entry.frame = Some(frame);
        entry.swap_loc = None;
        entry.in_ram = true;
        entry.last_access = now;

        if let Some(process) = processes.get_mut(&pid) {
            process.pages_in_swap.remove(&page);
            process.pages_in_ram.insert(page);
            process.last_access_time.insert(page, now);
        }

        (true, evicted)
    }

    /// Translates and records one memory access. Handles hits, faults
    /// against a swapped-out page, and faults against a page that was
    /// never loaded.
    pub fn access_page(
        &mut self,
        processes: &mut HashMap<Pid, Process>,
        pid: Pid,
        page: u32,
        now: u64,
    ) -> AccessOutcome {
        if !self.page_tables.contains_key(&pid) {
            return AccessOutcome::NoOp;
        }

        self.memory_accesses += 1;

        let (in_ram, swap_loc) = {
            let table = self.page_tables.get(&pid).unwrap();
            match table.get(page) {
                Some(entry) => (entry.in_ram, entry.swap_loc),
                None => return AccessOutcome::NoOp,
            }
        };

        if in_ram {
            let table = self.page_tables.get_mut(&pid).unwrap();
            table.get_mut(page).unwrap().last_access = now;
            if let Some(process) = processes.get_mut(&pid) {
                process.last_access_time.insert(page, now);
            }
            return AccessOutcome::Hit;
        }

        self.total_page_faults += 1;
        if let Some(process) = processes.get_mut(&pid) {
            process.page_faults += 1;
        }

        if swap_loc.is_some() {
            let (_, evicted) = self.swap_in(processes, pid, page, now);
            AccessOutcome::FaultSwapIn { evicted }
        } else {
            self.install_to_ram(processes, pid, std::iter::once(page), now);
            AccessOutcome::FaultInstall
        }
    }

    /// Releases every RAM frame and swap slot owned by `pid` and drops its
    /// page table.
    pub fn free_process(&mut self, pid: Pid) {
        self.ram.clear_all_for(pid);
        self.swap.clear_all_for(pid);
        self.page_tables.remove(&pid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc_map(pids: &[u64]) -> HashMap<Pid, Process> {
        pids.iter()
            .map(|&p| (Pid(p), Process::new(Pid(p), 8, 10, 5, None, 0)))
            .collect()
    }

    #[test]
    fn install_to_ram_fills_lowest_frames_first() {
        let mut mem = MemoryManager::new(16, 0, 4);
        let mut processes = proc_map(&[1]);
        mem.create_page_table(Pid(1), 2);
        mem.install_to_ram(&mut processes, Pid(1), 0..2, 5);

        let table = mem.page_table(Pid(1)).unwrap();
        assert_eq!(table.get(0).unwrap().frame, Some(0));
        assert_eq!(table.get(1).unwrap().frame, Some(1));
        assert_eq!(mem.ram_free(), 2);
    }

    #[test]
    fn pick_victim_prefers_oldest_then_lowest_pid_then_lowest_page() {
        let mut mem = MemoryManager::new(16, 16, 4);
        let mut processes = proc_map(&[1, 2]);

        mem.create_page_table(Pid(1), 2);
        mem.create_page_table(Pid(2), 2);
        mem.install_to_ram(&mut processes, Pid(1), 0..2, 1);
        mem.install_to_ram(&mut processes, Pid(2), 0..2, 1);

        // All four pages now share last_access=1; tie-break picks (Pid(1), page 0).
        assert_eq!(mem.pick_victim(), Some((Pid(1), 0)));
    }

    #[test]
    fn swap_out_then_swap_in_restores_residency() {
        let mut mem = MemoryManager::new(8, 8, 4);
        let mut processes = proc_map(&[1]);
        mem.create_page_table(Pid(1), 2);
        mem.install_to_ram(&mut processes, Pid(1), 0..2, 1);

        assert!(mem.swap_out(&mut processes, Pid(1), 0));
        assert_eq!(mem.total_swaps(), 1);
        assert!(!mem.page_table(Pid(1)).unwrap().get(0).unwrap().in_ram);
        assert!(processes[&Pid(1)].pages_in_swap.contains(&0));

        let (success, evicted) = mem.swap_in(&mut processes, Pid(1), 0, 9);
        assert!(success);
        assert_eq!(evicted, None);
        let entry = mem.page_table(Pid(1)).unwrap().get(0).unwrap();
        assert!(entry.in_ram);
        assert_eq!(entry.swap_loc, None);
        assert!(processes[&Pid(1)].pages_in_ram.contains(&0));
        assert_eq!(mem.swap_free(), 8 / 4);
    }

    #[test]
    fn swap_in_never_evicts_the_same_process_own_pages() {
        let mut mem = MemoryManager::new(4, 8, 4);
        let mut processes = proc_map(&[1]);
        mem.create_page_table(Pid(1), 2);
        mem.install_to_ram(&mut processes, Pid(1), 0..1, 1);
        mem.swap_out(&mut processes, Pid(1), 0);
        mem.install_to_ram(&mut processes, Pid(1), 1..2, 2);

        // RAM (capacity 1) now holds only page 1; page 0 sits in swap. A
        // swap-in of page 0 has nothing else to evict but page 1, which
        // belongs to the same process and must not be chosen.
        let (success, evicted) = mem.swap_in(&mut processes, Pid(1), 0, 3);
        assert!(!success);
        assert_eq!(evicted, None);
        assert!(mem.page_table(Pid(1)).unwrap().get(1).unwrap().in_ram);
    }

    #[test]
    fn access_page_on_resident_page_is_a_hit() {
        let mut mem = MemoryManager::new(8, 0, 4);
        let mut processes = proc_map(&[1]);
        mem.create_page_table(Pid(1), 1);
        mem.install_to_ram(&mut processes, Pid(1), 0..1, 1);

        mem.access_page(&mut processes, Pid(1), 0, 5);
        assert_eq!(mem.total_page_faults(), 0);
        assert_eq!(mem.memory_accesses(), 1);
        assert_eq!(processes[&Pid(1)].last_access_time[&0], 5);
    }

    #[test]
    fn access_page_on_never_loaded_page_faults_and_installs() {
        let mut mem = MemoryManager::new(8, 0, 4);
        let mut processes = proc_map(&[1]);
        mem.create_page_table(Pid(1), 2);

        mem.access_page(&mut processes, Pid(1), 1, 3);
        assert_eq!(mem.total_page_faults(), 1);
        assert!(mem.page_table(Pid(1)).unwrap().get(1).unwrap().in_ram);
        assert_eq!(processes[&Pid(1)].page_faults, 1);
    }

    #[test]
    fn free_process_releases_all_frames_and_drops_page_table() {
        let mut mem = MemoryManager::new(8, 8, 4);
        let mut processes = proc_map(&[1]);
        mem.create_page_table(Pid(1), 2);
        mem.install_to_ram(&mut processes, Pid(1), 0..2, 1);
        mem.swap_out(&mut processes, Pid(1), 0);

        mem.free_process(Pid(1));
        assert_eq!(mem.ram_free(), 2);
        assert_eq!(mem.swap_free(), 2);
        assert!(mem.page_table(Pid(1)).is_none());
    }
}
