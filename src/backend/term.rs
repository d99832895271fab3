//! Color-pair backend over VT sequences
//!
//! Models a curses-style terminal: colors exist only as registered pairs,
//! and bright colors are a bold overlay on top of a base-hue pair. The
//! pair table lives here; what reaches the terminal is the SGR rendition
//! of the active pair, emitted through crossterm.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, Colors, ResetColor, SetAttribute, SetColors},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, trace};

use super::Backend;
use crate::color::{AttributePair, ColorPairRegistry, PairStyle};
use crate::config::Config;
use crate::error::{ConioError, Result};
use crate::input::{self, Key};
use crate::screen::Size;

/// Pair-model terminal backend writing to `W`.
pub struct TermBackend<W: Write> {
    out: W,
    registry: ColorPairRegistry,
    current: PairStyle,
    /// Whether `out` is the process terminal (raw mode, real size, input)
    owns_terminal: bool,
    /// Size reported when `out` is not the process terminal
    fixed_size: Option<Size>,
    /// Last byte written was a carriage return
    after_cr: bool,
}

impl TermBackend<Stdout> {
    /// Backend for the process terminal.
    pub fn stdout(config: &Config) -> Self {
        Self {
            out: io::stdout(),
            registry: ColorPairRegistry::new(config.max_color_pairs),
            current: PairStyle::NORMAL,
            owns_terminal: true,
            fixed_size: None,
            after_cr: false,
        }
    }
}

impl<W: Write> TermBackend<W> {
    /// Backend rendering into an arbitrary sink with a fixed size.
    ///
    /// Raw mode is never touched and no input is available.
    pub fn with_writer(out: W, size: Size, config: &Config) -> Self {
        Self {
            out,
            registry: ColorPairRegistry::new(config.max_color_pairs),
            current: PairStyle::NORMAL,
            owns_terminal: false,
            fixed_size: Some(size),
            after_cr: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn registry(&self) -> &ColorPairRegistry {
        &self.registry
    }

    /// The active native rendition.
    pub fn current_style(&self) -> PairStyle {
        self.current
    }

    fn apply_style(&mut self, style: PairStyle) -> Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset))?;
        if let Some((fg, bg)) = self.registry.colors(style.handle) {
            queue!(
                self.out,
                SetColors(Colors::new(fg.to_crossterm(), bg.to_crossterm()))
            )?;
        }
        if style.bold {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        self.current = style;
        Ok(())
    }
}

/// Best-effort restore for the panic hook.
fn restore_process_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        SetAttribute(Attribute::Reset),
        ResetColor,
        Show,
        LeaveAlternateScreen
    );
    let _ = terminal::disable_raw_mode();
}

impl<W: Write> Backend for TermBackend<W> {
    fn claims_terminal(&self) -> bool {
        self.owns_terminal
    }

    fn enter(&mut self, cursor_visible: bool) -> Result<()> {
        debug!("Entering pair-model terminal (owns terminal: {})", self.owns_terminal);
        self.registry.reset();
        self.current = PairStyle::NORMAL;
        self.after_cr = false;

        if self.owns_terminal {
            terminal::enable_raw_mode()?;
        }

        queue!(
            self.out,
            EnterAlternateScreen,
            SetAttribute(Attribute::Reset),
            ResetColor
        )?;
        if cursor_visible {
            queue!(self.out, Show)?;
        } else {
            queue!(self.out, Hide)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        debug!("Leaving pair-model terminal");
        let written = queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            Show,
            LeaveAlternateScreen
        )
        .and_then(|_| self.out.flush());

        // Raw mode goes back even if the sequences could not be written.
        if self.owns_terminal {
            terminal::disable_raw_mode()?;
        }
        written?;
        Ok(())
    }

    fn set_attributes(&mut self, pair: AttributePair) -> Result<()> {
        let style = self.registry.style_for(pair)?;
        trace!("Pair {} bold={} for {:?}", style.handle.0, style.bold, pair);
        self.apply_style(style)
    }

    fn reset_attributes(&mut self) -> Result<()> {
        self.apply_style(PairStyle::NORMAL)
    }

    fn move_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        queue!(self.out, MoveTo(x, y))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        // Erase uses the active background (bce), so the rendition is
        // already in place; home the cursor afterwards.
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        if visible {
            queue!(self.out, Show)?;
        } else {
            queue!(self.out, Hide)?;
        }
        Ok(())
    }

    fn size(&self) -> Option<Size> {
        if !self.owns_terminal {
            return self.fixed_size;
        }
        match terminal::size() {
            Ok((cols, rows)) if cols > 0 && rows > 0 => Some(Size { cols, rows }),
            _ => None,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        // Raw mode turns off output processing, so a bare LF would keep
        // the column. Emit CR LF like curses does.
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let after_cr = if i == 0 { self.after_cr } else { bytes[i - 1] == b'\r' };
            if b == b'\n' && !after_cr {
                self.out.write_all(&bytes[start..i])?;
                self.out.write_all(b"\r")?;
                start = i;
            }
        }
        self.out.write_all(&bytes[start..])?;
        if let Some(&last) = bytes.last() {
            self.after_cr = last == b'\r';
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn read_key(&mut self) -> Result<Key> {
        if !self.owns_terminal {
            return Err(ConioError::InputExhausted);
        }
        input::read_terminal_key()
    }

    fn try_read_key(&mut self) -> Result<Option<Key>> {
        if !self.owns_terminal {
            return Ok(None);
        }
        input::poll_terminal_key()
    }

    fn emergency_restore(&self) -> Option<fn()> {
        if self.owns_terminal {
            Some(restore_process_terminal)
        } else {
            None
        }
    }
}
