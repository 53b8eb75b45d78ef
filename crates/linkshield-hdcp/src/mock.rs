//! Scripted in-memory backend for supervision tests

use linkshield_core::{Error, LinkBackend, Result};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// A `LinkBackend` that plays back a configured script and records every
/// call it receives.
///
/// Link status answers are consumed from a queue; once the queue is
/// empty, `status_tail` answers every further query. Enable calls
/// succeed unless a failing call number is configured.
pub(crate) struct MockLink {
    supported: bool,
    status_script: Mutex<VecDeque<bool>>,
    status_tail: bool,
    enable_fails_on: Option<u32>,
    pub supported_calls: AtomicU32,
    pub enable_calls: AtomicU32,
    pub disable_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub pre_calls: AtomicU32,
    pub post_calls: AtomicU32,
}

impl MockLink {
    /// A supported link whose status queries all answer `status_tail`
    pub fn new(status_tail: bool) -> Self {
        Self {
            supported: true,
            status_script: Mutex::new(VecDeque::new()),
            status_tail,
            enable_fails_on: None,
            supported_calls: AtomicU32::new(0),
            enable_calls: AtomicU32::new(0),
            disable_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            pre_calls: AtomicU32::new(0),
            post_calls: AtomicU32::new(0),
        }
    }

    /// A link whose capability probe answers "unsupported"
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new(false)
        }
    }

    /// Queue explicit answers for the first status queries
    pub fn with_status_script(self, script: impl IntoIterator<Item = bool>) -> Self {
        self.status_script.lock().unwrap().extend(script);
        self
    }

    /// Make the nth enable call (1-based) fail with an IO error
    pub fn with_enable_failing_on(mut self, call: u32) -> Self {
        self.enable_fails_on = Some(call);
        self
    }
}

impl LinkBackend for MockLink {
    fn is_supported(&self) -> bool {
        self.supported_calls.fetch_add(1, Ordering::SeqCst);
        self.supported
    }

    fn enable_authentication(&self) -> Result<()> {
        let call = self.enable_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.enable_fails_on == Some(call) {
            return Err(Error::command(
                "enable-hdcp",
                io::Error::new(io::ErrorKind::Other, "scripted enable failure"),
            ));
        }
        Ok(())
    }

    fn disable_authentication(&self) -> Result<()> {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn check_link_status(&self) -> bool {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.status_tail)
    }

    fn pre_authentication(&self) {
        self.pre_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn post_authentication(&self) {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
    }
}
