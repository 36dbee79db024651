//! Tool-call instrumentation
//!
//! Replaces a host's `tools/call` handler with an [`InstrumentedHandler`]
//! exactly once. When the host has no handler yet, installation is retried
//! from the host's connect and tool-registration lifecycle hooks.

pub mod ports;
mod wrapper;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use agnost_domain::AgnostError;
use tracing::{debug, info, warn};

pub use wrapper::InstrumentedHandler;

use crate::host::ports::{HostServer, LifecycleHook};
use ports::CallRecorder;

/// Result of one installation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The wrapper is now the host's `tools/call` handler.
    Installed,
    /// The handler was already instrumented; nothing changed.
    AlreadyInstrumented,
    /// No handler registered yet; lifecycle hooks will retry.
    Deferred,
    Failed(AgnostError),
}

/// Installs the instrumentation wrapper on one host server.
pub struct Instrumentation {
    host: Weak<dyn HostServer>,
    recorder: Arc<dyn CallRecorder>,
    installed: AtomicBool,
}

impl Instrumentation {
    pub fn new(host: &Arc<dyn HostServer>, recorder: Arc<dyn CallRecorder>) -> Arc<Self> {
        Arc::new(Self { host: Arc::downgrade(host), recorder, installed: AtomicBool::new(false) })
    }

    /// Attempt installation now; if the host has no handler yet, register
    /// one-shot retry hooks on its connect and tool-registered events.
    pub fn install(self: &Arc<Self>) -> InstallOutcome {
        let outcome = self.try_install();
        if outcome != InstallOutcome::Deferred {
            return outcome;
        }

        let Some(host) = self.host.upgrade() else {
            return InstallOutcome::Failed(AgnostError::Instrumentation(
                "host server dropped".into(),
            ));
        };
        host.on_connect(self.retry_hook("connect"));
        host.on_tool_registered(self.retry_hook("tool_registered"));
        debug!("Tool-call handler not registered yet; deferring instrumentation");
        InstallOutcome::Deferred
    }

    /// Whether the wrapper has been installed.
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Single installation attempt. The first successful attempt is final.
    pub fn try_install(&self) -> InstallOutcome {
        if self.is_installed() {
            return InstallOutcome::AlreadyInstrumented;
        }

        let Some(host) = self.host.upgrade() else {
            return InstallOutcome::Failed(AgnostError::Instrumentation(
                "host server dropped".into(),
            ));
        };
        let Some(current) = host.tool_call_handler() else {
            return InstallOutcome::Deferred;
        };
        if current.is_instrumented() {
            self.installed.store(true, Ordering::SeqCst);
            debug!(instance = host.instance_id(), "Tool-call handler already instrumented");
            return InstallOutcome::AlreadyInstrumented;
        }
        if self.installed.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err()
        {
            return InstallOutcome::AlreadyInstrumented;
        }

        let wrapped = Arc::new(InstrumentedHandler::new(current, Arc::clone(&self.recorder)));
        match host.set_tool_call_handler(wrapped) {
            Ok(()) => {
                info!(instance = host.instance_id(), "Tool-call handler instrumented");
                InstallOutcome::Installed
            }
            Err(err) => {
                self.installed.store(false, Ordering::SeqCst);
                warn!(instance = host.instance_id(), error = %err, "Failed to instrument tool-call handler");
                InstallOutcome::Failed(err)
            }
        }
    }

    fn retry_hook(self: &Arc<Self>, trigger: &'static str) -> LifecycleHook {
        let this = Arc::downgrade(self);
        let fired = AtomicBool::new(false);
        Box::new(move || {
            if fired.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Some(this) = this.upgrade() {
                let outcome = this.try_install();
                debug!(trigger, ?outcome, "Deferred instrumentation attempt");
            }
        })
    }
}
