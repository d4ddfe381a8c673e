// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Platform Abstraction Module
//!
//! OS-specific facts the bootstrap layer needs before the scheduler starts:
//! how many cores to size the default fetch concurrency around, and whether
//! the process is running with elevated privileges (logged as a warning,
//! never enforced — this is a sync tool, not a setuid one).
//!
//! - **Interface**: [`Platform`] trait defines the contract
//! - **Implementations**: [`UnixPlatform`] (Linux/macOS), [`WindowsPlatform`]
//! - **Selection**: compile-time, via `#[cfg]`

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::UnixPlatform;

#[cfg(windows)]
pub use windows::WindowsPlatform;

/// Platform abstraction for the handful of OS facts bootstrap needs.
pub trait Platform: Send + Sync {
    /// Number of logical CPUs available to the process, used to size the
    /// GitHub client's default fetch concurrency when not overridden by
    /// config.
    fn cpu_count(&self) -> usize;

    /// `true` if running with elevated privileges (root on Unix,
    /// Administrator on Windows). Logged as a startup warning; this tool
    /// has no use for elevated privileges and running as one is almost
    /// always an operator mistake.
    fn is_elevated(&self) -> bool;

    /// Platform identifier for structured log fields: "linux", "macos",
    /// "windows".
    fn platform_name(&self) -> &'static str;
}

#[cfg(unix)]
type PlatformImpl = UnixPlatform;

#[cfg(windows)]
type PlatformImpl = WindowsPlatform;

/// Returns the platform implementation selected at compile time.
pub fn create_platform() -> Box<dyn Platform> {
    Box::new(PlatformImpl::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_platform_reports_at_least_one_cpu() {
        let platform = create_platform();
        assert!(platform.cpu_count() >= 1);
        assert!(!platform.platform_name().is_empty());
    }
}
