//! Platform backends.
//!
//! A backend is the native side of every primitive. It knows nothing about
//! sessions or tracked colors; [`Console`](crate::Console) owns that state
//! and always hands the backend a complete [`AttributePair`].
//!
//! - **console**: Win32 console, packed attribute word (Windows only)
//! - **term**: color-pair model rendered as VT sequences through crossterm
//! - **memory**: in-memory cell grid with scripted input, for tests and
//!   headless use
//!
//! # Selection
//!
//! ```text
//! DefaultBackend
//! ├── windows      -> ConsoleBackend
//! └── everything   -> TermBackend<Stdout>
//! ```
//!
//! `Box<dyn Backend>` is a backend too, for callers that pick at runtime.

#[cfg(windows)]
pub mod console;
pub mod memory;
pub mod term;

#[cfg(windows)]
pub use console::ConsoleBackend;
pub use memory::{AttrModel, MemoryBackend, Rendition};
pub use term::TermBackend;

use crate::color::AttributePair;
use crate::config::{BackendChoice, Config};
use crate::error::{ConioError, Result};
use crate::input::Key;
use crate::screen::Size;

/// Native operations behind the console primitives.
///
/// Methods other than [`flush`](Self::flush) may buffer; the session
/// flushes at the end of every primitive.
pub trait Backend {
    /// Whether this backend drives the process terminal. At most one
    /// session over such a backend can be live at a time.
    fn claims_terminal(&self) -> bool {
        true
    }

    /// Acquire the terminal: cbreak/raw input, no echo, special-key
    /// decoding, UTF-8 output, cursor visibility as given.
    fn enter(&mut self, cursor_visible: bool) -> Result<()>;

    /// Restore everything `enter` changed.
    fn leave(&mut self) -> Result<()>;

    /// Render subsequent output with these colors.
    fn set_attributes(&mut self, pair: AttributePair) -> Result<()>;

    /// Back to the normal rendition.
    fn reset_attributes(&mut self) -> Result<()>;

    /// Absolute cursor positioning, origin top-left.
    fn move_cursor(&mut self, x: u16, y: u16) -> Result<()>;

    /// Blank every cell using the current attributes and home the cursor.
    fn clear(&mut self) -> Result<()>;

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()>;

    /// Addressable size, or `None` if it cannot be determined.
    fn size(&self) -> Option<Size>;

    /// Write raw bytes at the cursor. Text is UTF-8.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    fn write_str(&mut self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Synchronization point: everything written so far becomes visible.
    fn flush(&mut self) -> Result<()>;

    /// Block until a key arrives.
    fn read_key(&mut self) -> Result<Key>;

    /// Take a key if one is pending, without blocking.
    fn try_read_key(&mut self) -> Result<Option<Key>>;

    /// Restore routine for the panic hook. It runs without access to the
    /// backend, so it may only touch process-wide terminal state.
    fn emergency_restore(&self) -> Option<fn()> {
        None
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn claims_terminal(&self) -> bool {
        (**self).claims_terminal()
    }

    fn enter(&mut self, cursor_visible: bool) -> Result<()> {
        (**self).enter(cursor_visible)
    }

    fn leave(&mut self) -> Result<()> {
        (**self).leave()
    }

    fn set_attributes(&mut self, pair: AttributePair) -> Result<()> {
        (**self).set_attributes(pair)
    }

    fn reset_attributes(&mut self) -> Result<()> {
        (**self).reset_attributes()
    }

    fn move_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        (**self).move_cursor(x, y)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        (**self).set_cursor_visible(visible)
    }

    fn size(&self) -> Option<Size> {
        (**self).size()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }

    fn write_str(&mut self, text: &str) -> Result<()> {
        (**self).write_str(text)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn read_key(&mut self) -> Result<Key> {
        (**self).read_key()
    }

    fn try_read_key(&mut self) -> Result<Option<Key>> {
        (**self).try_read_key()
    }

    fn emergency_restore(&self) -> Option<fn()> {
        (**self).emergency_restore()
    }
}

/// Compile-time platform backend.
#[cfg(windows)]
pub type DefaultBackend = ConsoleBackend;

/// Compile-time platform backend.
#[cfg(not(windows))]
pub type DefaultBackend = TermBackend<std::io::Stdout>;

/// Build the compile-time platform backend.
#[cfg(windows)]
pub fn default_backend(config: &Config) -> Result<DefaultBackend> {
    ConsoleBackend::new(config)
}

/// Build the compile-time platform backend.
#[cfg(not(windows))]
pub fn default_backend(config: &Config) -> Result<DefaultBackend> {
    Ok(TermBackend::stdout(config))
}

/// Build the backend named by `config.backend`.
pub fn select_backend(config: &Config) -> Result<Box<dyn Backend>> {
    match config.backend {
        BackendChoice::Auto => Ok(Box::new(default_backend(config)?)),
        BackendChoice::Terminal => Ok(Box::new(TermBackend::stdout(config))),
        #[cfg(windows)]
        BackendChoice::Console => Ok(Box::new(ConsoleBackend::new(config)?)),
        #[cfg(not(windows))]
        BackendChoice::Console => Err(ConioError::InvalidArgument(
            "the console backend is only available on Windows".to_string(),
        )),
    }
}
