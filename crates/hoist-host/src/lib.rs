//! Host side of a hoist run: command execution, provisioning phases, the
//! phase runner, the cache sweep and the final summary.

pub mod cache;
pub mod error;
pub mod executor;
pub mod fs;
pub mod phases;
pub mod preflight;
pub mod runner;
pub mod summary;

pub use cache::{SweepReport, sweep};
pub use error::{ExecError, FsError, JanitorError, PhaseError, PreflightError, RunError};
pub use executor::{CommandExecutor, Invocation, RealExecutor};
pub use fs::HostFs;
pub use phases::Phase;
pub use preflight::check_host;
pub use runner::{PhaseListener, PhaseOutcome, Provisioner, RunReport, Silent};
pub use summary::Summary;
