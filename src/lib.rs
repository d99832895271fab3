//! conio - Portable console I/O
//!
//! Classic console primitives on top of whatever the platform offers:
//! cursor positioning, sixteen-color text attributes, byte, character,
//! formatted and UTF-8 output, and single-key input with or without echo.
//!
//! # Features
//!
//! - **One color model**: a 16-entry palette reconciled with both the
//!   Windows packed attribute word and curses-style color pairs
//! - **Sessions**: explicit `init`/`cleanup`, restore on drop and on panic
//! - **Unicode**: UTF-8 output, wide characters, byte-wise or whole-key reads
//! - **Testable**: an in-memory backend with scripted input
//!
//! # Quick Start
//!
//! ```no_run
//! use conio::{cprintf, default_backend, Color, Config, Console};
//!
//! fn main() -> conio::Result<()> {
//!     let config = Config::default();
//!     let mut con = Console::with_config(default_backend(&config)?, config);
//!     con.init()?;
//!     con.clrscr()?;
//!     con.printf_at_colors(0, 0, Color::BrightYellow, Color::Blue, format_args!(" demo "))?;
//!     let (w, h) = (con.getwidth()?, con.getheight()?);
//!     cprintf!(con, "{}x{}", w, h)?;
//!     con.getch()?;
//!     con.cleanup()
//! }
//! ```

pub mod backend;
pub mod color;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod screen;
pub mod session;

pub use backend::{
    default_backend, select_backend, Backend, DefaultBackend, MemoryBackend, TermBackend,
};
#[cfg(windows)]
pub use backend::ConsoleBackend;
pub use color::{AttributePair, BaseColor, Color, PackedAttr};
pub use config::Config;
pub use error::{ConioError, Result};
pub use input::{Key, Modifiers};
pub use output::{format_bounded, ColorSpec, Placement};
pub use screen::Size;
pub use session::{Console, TerminalState};
