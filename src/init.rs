//! Process-wide one-time initialization.
//!
//! Hosts call [`initialize`] once at startup, before constructing a
//! [`RenderHost`](crate::host::RenderHost) or any tick source. The call is
//! idempotent; later calls return `Ok(())` without doing anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use lazy_static::lazy_static;

lazy_static! {
    static ref INIT_LOCK: Mutex<bool> = Mutex::new(false);
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Could not install global logger: {0}")]
    LoggerInstall(String),
}

/// Options for [`initialize_with`].
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Install an `env_logger` as the global `log` sink. Hosts that carry
    /// their own logger set this to `false`.
    pub install_logger: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self { install_logger: true }
    }
}

/// Initialize the engine binding with default options.
pub fn initialize() -> Result<(), InitError> {
    initialize_with(InitOptions::default())
}

/// Initialize the engine binding. Idempotent; only the first call does work.
pub fn initialize_with(options: InitOptions) -> Result<(), InitError> {
    let mut done = INIT_LOCK.lock().unwrap();
    if *done {
        return Ok(());
    }

    if options.install_logger {
        env_logger::Builder::from_default_env()
            .try_init()
            .map_err(|e| InitError::LoggerInstall(e.to_string()))?;
    }

    *done = true;
    INITIALIZED.store(true, Ordering::Release);

    log::debug!("lumen engine binding initialized");
    Ok(())
}

/// Cheap query for whether [`initialize`] has completed.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Initialization must be idempotent: the second call is a no-op that
    /// still reports success.
    #[test]
    fn initialize_twice_is_ok() {
        // Skip logger install so the test does not fight other tests (or the
        // test harness) over the global log sink.
        let opts = InitOptions { install_logger: false };

        initialize_with(opts.clone()).unwrap();
        assert!(is_initialized());

        initialize_with(opts).unwrap();
        assert!(is_initialized());
    }
}
