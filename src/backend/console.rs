//! Win32 console backend
//!
//! Colors are the packed attribute word set through
//! `SetConsoleTextAttribute`; positioning, clearing and cursor visibility go
//! straight to the console API. Input comes through crossterm, which reads
//! console input records on this platform.

use std::io::{self, Stdout, Write};

use crossterm::{cursor::Show, execute, style::ResetColor, terminal};
use tracing::{debug, trace, warn};
use windows::Win32::Foundation::{BOOL, HANDLE};
use windows::Win32::System::Console::{
    FillConsoleOutputAttribute, FillConsoleOutputCharacterW, GetConsoleCP,
    GetConsoleCursorInfo, GetConsoleOutputCP, GetConsoleScreenBufferInfo, GetStdHandle,
    SetConsoleCP, SetConsoleCursorInfo, SetConsoleCursorPosition, SetConsoleOutputCP,
    SetConsoleTextAttribute, CONSOLE_CHARACTER_ATTRIBUTES, CONSOLE_CURSOR_INFO,
    CONSOLE_SCREEN_BUFFER_INFO, COORD, STD_OUTPUT_HANDLE,
};

use super::Backend;
use crate::color::{AttributePair, PackedAttr};
use crate::config::Config;
use crate::error::{ConioError, Result};
use crate::input::{self, Key};
use crate::screen::Size;

/// Packed-attribute backend over the process console.
pub struct ConsoleBackend {
    handle: HANDLE,
    out: Stdout,
    current: PackedAttr,
    codepage: Option<u32>,
    /// Attribute word found at construction, restored on leave
    saved_attrs: u16,
    /// (output, input) code pages found on enter
    saved_codepages: Option<(u32, u32)>,
}

impl ConsoleBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let handle = unsafe { GetStdHandle(STD_OUTPUT_HANDLE) }.map_err(ConioError::Console)?;
        let info = screen_buffer_info(handle)?;
        debug!(
            "Console buffer {}x{}, attributes 0x{:04X}",
            info.dwSize.X, info.dwSize.Y, info.wAttributes.0
        );
        Ok(Self {
            handle,
            out: io::stdout(),
            current: PackedAttr::NORMAL,
            codepage: config.codepage,
            saved_attrs: info.wAttributes.0,
            saved_codepages: None,
        })
    }

    /// The active attribute byte.
    pub fn current_attr(&self) -> PackedAttr {
        self.current
    }

    fn apply(&mut self, attr: PackedAttr) -> Result<()> {
        // Pending text must land with the old attributes.
        self.out.flush()?;
        unsafe { SetConsoleTextAttribute(self.handle, CONSOLE_CHARACTER_ATTRIBUTES(attr.word())) }
            .map_err(ConioError::Console)?;
        self.current = attr;
        Ok(())
    }

    fn set_codepages(&self, output: u32, input: u32) -> Result<()> {
        unsafe {
            SetConsoleOutputCP(output).map_err(ConioError::Console)?;
            SetConsoleCP(input).map_err(ConioError::Console)?;
        }
        Ok(())
    }
}

fn screen_buffer_info(handle: HANDLE) -> Result<CONSOLE_SCREEN_BUFFER_INFO> {
    let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
    unsafe { GetConsoleScreenBufferInfo(handle, &mut info) }.map_err(ConioError::Console)?;
    Ok(info)
}

/// Best-effort restore for the panic hook.
fn restore_process_console() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, ResetColor, Show);
    let _ = terminal::disable_raw_mode();
}

impl Backend for ConsoleBackend {
    fn enter(&mut self, cursor_visible: bool) -> Result<()> {
        if let Some(cp) = self.codepage {
            let saved = unsafe { (GetConsoleOutputCP(), GetConsoleCP()) };
            debug!("Switching console code pages {:?} -> {}", saved, cp);
            self.set_codepages(cp, cp)?;
            self.saved_codepages = Some(saved);
        }
        terminal::enable_raw_mode()?;
        self.apply(PackedAttr::NORMAL)?;
        self.set_cursor_visible(cursor_visible)
    }

    fn leave(&mut self) -> Result<()> {
        debug!("Restoring console state");
        let mut first_error = None;

        let attrs = PackedAttr::from_word(self.saved_attrs);
        if let Err(e) = self.apply(attrs) {
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.set_cursor_visible(true) {
            first_error.get_or_insert(e);
        }
        if let Some((output, input)) = self.saved_codepages.take() {
            if let Err(e) = self.set_codepages(output, input) {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = terminal::disable_raw_mode() {
            first_error.get_or_insert(e.into());
        }

        match first_error {
            Some(e) => {
                warn!("Console restore incomplete: {}", e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn set_attributes(&mut self, pair: AttributePair) -> Result<()> {
        let attr = PackedAttr::pack(pair);
        trace!("Console attribute 0x{:02X} for {:?}", attr.0, pair);
        self.apply(attr)
    }

    fn reset_attributes(&mut self) -> Result<()> {
        self.apply(PackedAttr::NORMAL)
    }

    fn move_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        let (x, y) = match (i16::try_from(x), i16::try_from(y)) {
            (Ok(x), Ok(y)) => (x, y),
            _ => {
                return Err(ConioError::InvalidArgument(format!(
                    "position ({}, {}) beyond console coordinates",
                    x, y
                )))
            }
        };
        self.out.flush()?;
        unsafe { SetConsoleCursorPosition(self.handle, COORD { X: x, Y: y }) }
            .map_err(ConioError::Console)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.out.flush()?;
        let info = screen_buffer_info(self.handle)?;
        let cells = (info.dwSize.X.max(0) as u32) * (info.dwSize.Y.max(0) as u32);
        let origin = COORD { X: 0, Y: 0 };
        let mut written = 0u32;
        unsafe {
            FillConsoleOutputCharacterW(self.handle, ' ' as u16, cells, origin, &mut written)
                .map_err(ConioError::Console)?;
            FillConsoleOutputAttribute(self.handle, info.wAttributes.0, cells, origin, &mut written)
                .map_err(ConioError::Console)?;
            SetConsoleCursorPosition(self.handle, origin).map_err(ConioError::Console)?;
        }
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        let mut info = CONSOLE_CURSOR_INFO::default();
        unsafe {
            GetConsoleCursorInfo(self.handle, &mut info).map_err(ConioError::Console)?;
            info.bVisible = BOOL::from(visible);
            SetConsoleCursorInfo(self.handle, &info).map_err(ConioError::Console)?;
        }
        Ok(())
    }

    fn size(&self) -> Option<Size> {
        let info = screen_buffer_info(self.handle).ok()?;
        let window = info.srWindow;
        let cols = window.Right - window.Left + 1;
        let rows = window.Bottom - window.Top + 1;
        if cols <= 0 || rows <= 0 {
            return None;
        }
        Some(Size {
            cols: cols as u16,
            rows: rows as u16,
        })
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn read_key(&mut self) -> Result<Key> {
        input::read_terminal_key()
    }

    fn try_read_key(&mut self) -> Result<Option<Key>> {
        input::poll_terminal_key()
    }

    fn emergency_restore(&self) -> Option<fn()> {
        Some(restore_process_console)
    }
}
