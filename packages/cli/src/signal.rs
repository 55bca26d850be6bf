//! Ctrl-C handling: the first SIGINT cancels the running copy, a second one
//! terminates the process.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use progcp_copy::CancelToken;

static CANCEL_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

#[cfg(unix)]
extern "C" fn handle_sigint(_: libc::c_int) {
    if let Some(flag) = CANCEL_FLAG.get() {
        flag.store(true, Ordering::SeqCst);
    }
    // SAFETY: `signal` is async-signal-safe.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

/// Cancel `token` when the process receives SIGINT.
///
/// Only the first token registered is wired up.
pub fn cancel_on_interrupt(token: &CancelToken) {
    if CANCEL_FLAG.set(token.flag()).is_err() {
        log::warn!("Interrupt handler already installed");
        return;
    }

    #[cfg(unix)]
    {
        // SAFETY: the handler only touches an atomic and re-arms the default
        // disposition.
        let previous = unsafe {
            libc::signal(
                libc::SIGINT,
                handle_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t,
            )
        };
        if previous == libc::SIG_ERR {
            log::warn!("Failed to install SIGINT handler");
        } else {
            log::debug!("Installed SIGINT handler");
        }
    }

    #[cfg(not(unix))]
    log::debug!("Interrupt handling is not supported on this platform");
}
