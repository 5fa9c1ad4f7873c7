//! Construction-time failures.
//!
//! Domain operations on a running [`crate::kernel::Kernel`] never return
//! [`Result`]; per the error taxonomy, they report soft failure as
//! `bool`/`Option` and treat internal inconsistency as fatal. `Result` is
//! reserved for things that happen before a kernel exists at all: reading
//! and parsing a [`crate::config::SimConfig`].

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("page_kb ({page_kb}) must divide ram_kb ({ram_kb}) evenly")]
    RamNotPageAligned { ram_kb: u32, page_kb: u32 },

    #[error("page_kb ({page_kb}) must divide swap_kb ({swap_kb}) evenly")]
    SwapNotPageAligned { swap_kb: u32, page_kb: u32 },

    #[error("page_kb must be greater than zero")]
    ZeroPageSize,
}
