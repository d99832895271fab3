//! Console session
//!
//! [`Console`] owns a backend and the logical terminal state. Every
//! primitive checks that the session is active, performs its effect on the
//! backend and ends with a flush, so callers never need an explicit refresh.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──init()──> active ──cleanup()/drop──> inactive ──init()──> active
//!                     │
//!                     └──init()──> InvalidState
//! ```
//!
//! Only one session can hold the process terminal at a time. Backends that
//! do not touch it (the in-memory backend, VT output into a buffer) are not
//! subject to that limit.

use std::collections::VecDeque;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

use tracing::{debug, trace, warn};

use crate::backend::Backend;
use crate::color::{AttributePair, Color, PackedAttr};
use crate::config::Config;
use crate::error::{ConioError, Result};
use crate::input::Key;

/// Set while a session holds the process terminal.
static TERMINAL_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Restore routine of the session holding the process terminal.
static EMERGENCY_RESTORE: Mutex<Option<fn()>> = Mutex::new(None);

static PANIC_HOOK: Once = Once::new();

/// Chain a hook that puts the terminal back before the panic message is
/// printed.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let restore = *EMERGENCY_RESTORE
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(restore) = restore {
                restore();
            }
            previous(info);
        }));
    });
}

fn set_emergency_restore(restore: Option<fn()>) {
    *EMERGENCY_RESTORE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = restore;
}

/// Logical state of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalState {
    /// Colors last set through the session
    pub colors: AttributePair,
    pub cursor_visible: bool,
    /// Keys seen by a non-blocking poll, delivered before new input
    pub(crate) pending_keys: VecDeque<Key>,
    /// Remaining UTF-8 bytes of a character read byte-wise
    pub(crate) pending_bytes: VecDeque<u8>,
}

impl TerminalState {
    fn new(cursor_visible: bool) -> Self {
        Self {
            colors: AttributePair::DEFAULT,
            cursor_visible,
            pending_keys: VecDeque::new(),
            pending_bytes: VecDeque::new(),
        }
    }
}

/// A console session over backend `B`.
pub struct Console<B: Backend> {
    pub(crate) backend: B,
    pub(crate) state: TerminalState,
    pub(crate) config: Config,
    active: bool,
    /// Whether this session holds the process terminal claim
    claimed: bool,
}

impl<B: Backend> Console<B> {
    /// Create an inactive session with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, Config::default())
    }

    pub fn with_config(backend: B, config: Config) -> Self {
        let state = TerminalState::new(config.cursor_visible);
        Self {
            backend,
            state,
            config,
            active: false,
            claimed: false,
        }
    }

    /// Create and initialize a session in one step.
    pub fn open(backend: B) -> Result<Self> {
        let mut console = Self::new(backend);
        console.init()?;
        Ok(console)
    }

    /// Acquire the terminal: cbreak input without echo, special-key
    /// decoding, UTF-8 output, cursor as configured.
    ///
    /// Fails with [`ConioError::InvalidState`] if this session is already
    /// active or another session holds the process terminal.
    pub fn init(&mut self) -> Result<()> {
        if self.active {
            return Err(ConioError::InvalidState("session already initialized"));
        }

        let claims = self.backend.claims_terminal();
        if claims {
            if TERMINAL_CLAIMED
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(ConioError::InvalidState(
                    "another session holds the terminal",
                ));
            }
            install_panic_hook();
            set_emergency_restore(self.backend.emergency_restore());
        }

        if let Err(e) = self.backend.enter(self.config.cursor_visible) {
            // Undo whatever part of enter went through.
            if let Err(restore) = self.backend.leave() {
                warn!("Restore after failed init incomplete: {}", restore);
            }
            if claims {
                set_emergency_restore(None);
                TERMINAL_CLAIMED.store(false, Ordering::Release);
            }
            return Err(e);
        }

        self.claimed = claims;
        self.active = true;
        self.state = TerminalState::new(self.config.cursor_visible);
        debug!("Console session started (claims terminal: {})", claims);
        Ok(())
    }

    /// Restore the terminal to its pre-init state. No-op when inactive.
    ///
    /// The session is inactive afterwards even if restoring failed.
    pub fn cleanup(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let result = self.backend.leave();

        if self.claimed {
            set_emergency_restore(None);
            TERMINAL_CLAIMED.store(false, Ordering::Release);
            self.claimed = false;
        }
        self.state = TerminalState::new(self.config.cursor_visible);
        debug!("Console session ended");
        result
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(ConioError::SessionNotActive)
        }
    }

    /// End of a primitive: make its effect visible.
    pub(crate) fn sync(&mut self) -> Result<()> {
        self.backend.flush()
    }

    /// Apply a full pair without flushing.
    pub(crate) fn apply_colors(&mut self, pair: AttributePair) -> Result<()> {
        trace!("Colors {} on {}", pair.fg, pair.bg);
        self.backend.set_attributes(pair)?;
        self.state.colors = pair;
        Ok(())
    }

    // ---- Color operations ----

    /// Set both colors. Later output uses them until changed.
    pub fn set_colors(&mut self, fg: Color, bg: Color) -> Result<()> {
        self.ensure_active()?;
        self.apply_colors(AttributePair::new(fg, bg))?;
        self.sync()
    }

    /// Change the foreground, keeping the current background.
    pub fn set_foreground(&mut self, fg: Color) -> Result<()> {
        let bg = self.state.colors.bg;
        self.set_colors(fg, bg)
    }

    /// Change the background, keeping the current foreground.
    pub fn set_background(&mut self, bg: Color) -> Result<()> {
        let fg = self.state.colors.fg;
        self.set_colors(fg, bg)
    }

    /// Back to light grey on black.
    pub fn reset_colors(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.backend.reset_attributes()?;
        self.state.colors = AttributePair::DEFAULT;
        self.sync()
    }

    /// The pair last set through this session.
    pub fn colors(&self) -> AttributePair {
        self.state.colors
    }

    /// Classic `textcolor`: foreground by palette index.
    pub fn textcolor(&mut self, color: i32) -> Result<()> {
        self.set_foreground(Color::try_from(color)?)
    }

    /// Classic `textbackground`: background by palette index.
    pub fn textbackground(&mut self, color: i32) -> Result<()> {
        self.set_background(Color::try_from(color)?)
    }

    /// Classic `textattr`: foreground in the low nibble, background in the
    /// high nibble.
    pub fn textattr(&mut self, attr: u8) -> Result<()> {
        let pair = PackedAttr(attr).unpack();
        self.set_colors(pair.fg, pair.bg)
    }

    /// Classic `resetattr`.
    pub fn resetattr(&mut self) -> Result<()> {
        self.reset_colors()
    }
}

impl<B: Backend> Drop for Console<B> {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!("Console restore on drop failed: {}", e);
        }
    }
}
