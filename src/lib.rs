//! Coin Market Terminal - Main Library
//!
//! Re-exports the workspace libraries and the helpers shared by the binaries.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//! - **coinmarket**: Market domain, API clients and views (re-exported from workspace)
//! - **hypersockets**: Streaming connection library (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use coinmarket_terminal::bin_common::{load_config_from_env, ConfigType};
//! use coinmarket_terminal::coinmarket::TerminalConfig;
//! ```

// Re-export workspace libraries for convenience
pub use coinmarket;
pub use hypersockets;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use runner::{BinaryRunner, RunConfig, ShutdownSignal};
}
