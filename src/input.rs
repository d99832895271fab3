//! Key input
//!
//! Translates crossterm key events into [`Key`] values and assigns each
//! key a classic integer code: characters map to their code point, special
//! keys use the curses `KEY_*` numbering (all >= 256).
//!
//! Reads on a [`Console`] come in two flavors. The byte-oriented reads
//! (`getch`) deliver a non-ASCII character one UTF-8 byte per call, the
//! wide reads (`getwch`) deliver whole keys.

use std::time::Duration;

use bitflags::bitflags;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::backend::Backend;
use crate::error::Result;
use crate::session::Console;

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// A decoded key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character, control characters included (Ctrl+A is `'\u{1}'`)
    Char(char),
    Enter,
    Tab,
    BackTab,
    Backspace,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    /// Function key F1..=F63
    F(u8),
}

/// curses key codes
pub mod codes {
    pub const KEY_DOWN: u32 = 0o402;
    pub const KEY_UP: u32 = 0o403;
    pub const KEY_LEFT: u32 = 0o404;
    pub const KEY_RIGHT: u32 = 0o405;
    pub const KEY_HOME: u32 = 0o406;
    pub const KEY_BACKSPACE: u32 = 0o407;
    pub const KEY_F0: u32 = 0o410;
    pub const KEY_DC: u32 = 0o512;
    pub const KEY_IC: u32 = 0o513;
    pub const KEY_NPAGE: u32 = 0o522;
    pub const KEY_PPAGE: u32 = 0o523;
    pub const KEY_BTAB: u32 = 0o541;
    pub const KEY_END: u32 = 0o550;
}

impl Key {
    /// Integer key code.
    ///
    /// Enter reports `'\n'`, Tab `'\t'`, Esc `27`.
    pub fn code(self) -> u32 {
        use codes::*;
        match self {
            Key::Char(ch) => ch as u32,
            Key::Enter => '\n' as u32,
            Key::Tab => '\t' as u32,
            Key::Esc => 0x1B,
            Key::BackTab => KEY_BTAB,
            Key::Backspace => KEY_BACKSPACE,
            Key::Up => KEY_UP,
            Key::Down => KEY_DOWN,
            Key::Left => KEY_LEFT,
            Key::Right => KEY_RIGHT,
            Key::Home => KEY_HOME,
            Key::End => KEY_END,
            Key::PageUp => KEY_PPAGE,
            Key::PageDown => KEY_NPAGE,
            Key::Insert => KEY_IC,
            Key::Delete => KEY_DC,
            Key::F(n) => KEY_F0 + n as u32,
        }
    }

    /// The character this key echoes, if it is printable
    pub fn printable(self) -> Option<char> {
        match self {
            Key::Char(ch) if !ch.is_control() => Some(ch),
            _ => None,
        }
    }

    /// Translate a crossterm key event. Key releases and keys without a
    /// classic code (media keys, bare modifiers) yield `None`.
    pub fn from_event(event: &KeyEvent) -> Option<Key> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Some(Key::Char(Self::map_char(ch, mods))),
            KeyCode::Enter => Some(Key::Enter),
            KeyCode::Tab if mods.contains(Modifiers::SHIFT) => Some(Key::BackTab),
            KeyCode::Tab => Some(Key::Tab),
            KeyCode::BackTab => Some(Key::BackTab),
            KeyCode::Backspace => Some(Key::Backspace),
            KeyCode::Esc => Some(Key::Esc),
            KeyCode::Up => Some(Key::Up),
            KeyCode::Down => Some(Key::Down),
            KeyCode::Left => Some(Key::Left),
            KeyCode::Right => Some(Key::Right),
            KeyCode::Home => Some(Key::Home),
            KeyCode::End => Some(Key::End),
            KeyCode::PageUp => Some(Key::PageUp),
            KeyCode::PageDown => Some(Key::PageDown),
            KeyCode::Insert => Some(Key::Insert),
            KeyCode::Delete => Some(Key::Delete),
            KeyCode::F(n) if (1..64).contains(&n) => Some(Key::F(n)),
            _ => None,
        }
    }

    /// Apply Ctrl to a character the way a cbreak terminal delivers it
    fn map_char(ch: char, mods: Modifiers) -> char {
        if !mods.contains(Modifiers::CTRL) {
            return ch;
        }
        if ch.is_ascii_alphabetic() {
            return ((ch.to_ascii_lowercase() as u8) - b'a' + 1) as char;
        }
        match ch {
            '@' | '`' | ' ' => '\u{0}',
            '[' => '\u{1b}',
            '\\' => '\u{1c}',
            ']' => '\u{1d}',
            '^' | '~' => '\u{1e}',
            '_' | '?' => '\u{1f}',
            _ => ch,
        }
    }

    /// UTF-8 bytes of a character key; empty for special keys.
    pub fn utf8(self) -> Vec<u8> {
        match self {
            Key::Char(ch) => ch.to_string().into_bytes(),
            _ => Vec::new(),
        }
    }
}

/// Block until a key press arrives on the process terminal.
///
/// Mouse, focus, paste and resize events are discarded.
pub fn read_terminal_key() -> Result<Key> {
    loop {
        if let Event::Key(key_event) = event::read()? {
            if let Some(key) = Key::from_event(&key_event) {
                return Ok(key);
            }
        }
    }
}

/// Take a key press from the process terminal if one is already queued.
///
/// Never blocks. Non-key events ahead of the key are discarded.
pub fn poll_terminal_key() -> Result<Option<Key>> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key_event) = event::read()? {
            if let Some(key) = Key::from_event(&key_event) {
                return Ok(Some(key));
            }
        }
    }
    Ok(None)
}

impl<B: Backend> Console<B> {
    fn next_key(&mut self) -> Result<Key> {
        match self.state.pending_keys.pop_front() {
            Some(key) => Ok(key),
            None => self.backend.read_key(),
        }
    }

    /// Code of `key` for a byte-oriented read. The trailing bytes of a
    /// multi-byte character are queued for the following reads.
    fn split_key(&mut self, key: Key) -> i32 {
        if let Key::Char(ch) = key {
            if !ch.is_ascii() {
                let bytes = key.utf8();
                if let Some((first, rest)) = bytes.split_first() {
                    self.state.pending_bytes.extend(rest);
                    return *first as i32;
                }
            }
        }
        key.code() as i32
    }

    fn echo(&mut self, key: Key) -> Result<()> {
        if let Some(ch) = key.printable() {
            let mut utf8 = [0u8; 4];
            self.backend.write_str(ch.encode_utf8(&mut utf8))?;
            self.sync()?;
        }
        Ok(())
    }

    /// Block for one key without echo. Returns a byte of a character or a
    /// special key code.
    pub fn read_key(&mut self) -> Result<i32> {
        self.ensure_active()?;
        if let Some(byte) = self.state.pending_bytes.pop_front() {
            return Ok(byte as i32);
        }
        let key = self.next_key()?;
        Ok(self.split_key(key))
    }

    /// Like [`read_key`](Self::read_key), echoing printable characters at
    /// the cursor with the current colors.
    pub fn read_key_echo(&mut self) -> Result<i32> {
        self.ensure_active()?;
        // The whole character was echoed when its first byte was read.
        if let Some(byte) = self.state.pending_bytes.pop_front() {
            return Ok(byte as i32);
        }
        let key = self.next_key()?;
        self.echo(key)?;
        Ok(self.split_key(key))
    }

    /// Block for one whole key without echo.
    ///
    /// Bytes left over from a byte-oriented read of the previous character
    /// are discarded.
    pub fn read_wide_key(&mut self) -> Result<Key> {
        self.ensure_active()?;
        self.state.pending_bytes.clear();
        self.next_key()
    }

    /// Like [`read_wide_key`](Self::read_wide_key), with echo.
    pub fn read_wide_key_echo(&mut self) -> Result<Key> {
        let key = self.read_wide_key()?;
        self.echo(key)?;
        Ok(key)
    }

    /// Whether a key can be read without blocking. Never consumes input.
    pub fn key_available(&mut self) -> Result<bool> {
        self.ensure_active()?;
        if !self.state.pending_bytes.is_empty() || !self.state.pending_keys.is_empty() {
            return Ok(true);
        }
        match self.backend.try_read_key()? {
            Some(key) => {
                // Push back so the next read observes it.
                self.state.pending_keys.push_back(key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Classic `getch`.
    pub fn getch(&mut self) -> Result<i32> {
        self.read_key()
    }

    /// Classic `getche`.
    pub fn getche(&mut self) -> Result<i32> {
        self.read_key_echo()
    }

    /// Classic `getwch`.
    pub fn getwch(&mut self) -> Result<Key> {
        self.read_wide_key()
    }

    /// Classic `getwche`.
    pub fn getwche(&mut self) -> Result<Key> {
        self.read_wide_key_echo()
    }

    /// Classic `kbhit`.
    pub fn kbhit(&mut self) -> Result<bool> {
        self.key_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::ConioError;

    fn key_event(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn test_char_keys() {
        let event = key_event(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(Key::from_event(&event), Some(Key::Char('a')));

        // Ctrl+C
        let event = key_event(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(Key::from_event(&event), Some(Key::Char('\u{3}')));

        // Ctrl+[ is ESC
        let event = key_event(KeyCode::Char('['), KeyModifiers::CONTROL);
        assert_eq!(Key::from_event(&event).map(Key::code), Some(0x1B));

        // Alt is not encoded
        let event = key_event(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(Key::from_event(&event), Some(Key::Char('x')));
    }

    #[test]
    fn test_special_keys() {
        let event = key_event(KeyCode::Tab, KeyModifiers::SHIFT);
        assert_eq!(Key::from_event(&event), Some(Key::BackTab));

        let event = key_event(KeyCode::F(5), KeyModifiers::NONE);
        assert_eq!(Key::from_event(&event), Some(Key::F(5)));

        let event = key_event(KeyCode::Null, KeyModifiers::NONE);
        assert_eq!(Key::from_event(&event), None);
    }

    #[test]
    fn test_release_ignored() {
        let mut event = key_event(KeyCode::Char('q'), KeyModifiers::NONE);
        event.kind = KeyEventKind::Release;
        assert_eq!(Key::from_event(&event), None);
    }

    #[test]
    fn test_codes() {
        assert_eq!(Key::Char('A').code(), 65);
        assert_eq!(Key::Char('é').code(), 0xE9);
        assert_eq!(Key::Enter.code(), 10);
        assert_eq!(Key::Esc.code(), 27);
        assert_eq!(Key::Down.code(), 258);
        assert_eq!(Key::Up.code(), 259);
        assert_eq!(Key::Backspace.code(), 263);
        assert_eq!(Key::F(1).code(), 265);
        assert_eq!(Key::PageDown.code(), 338);
        assert_eq!(Key::End.code(), 360);
        assert!(Key::Delete.code() >= 256);
    }

    #[test]
    fn test_printable() {
        assert_eq!(Key::Char('z').printable(), Some('z'));
        assert_eq!(Key::Char('\u{3}').printable(), None);
        assert_eq!(Key::Enter.printable(), None);
    }

    #[test]
    fn test_utf8() {
        assert_eq!(Key::Char('€').utf8(), vec![0xE2, 0x82, 0xAC]);
        assert!(Key::Left.utf8().is_empty());
    }

    fn console() -> Console<MemoryBackend> {
        Console::open(MemoryBackend::new(20, 3)).unwrap()
    }

    #[test]
    fn test_getch_splits_utf8() {
        let mut con = console();
        con.backend_mut().push_str("a€");
        assert_eq!(con.getch().unwrap(), 'a' as i32);
        assert_eq!(con.getch().unwrap(), 0xE2);
        assert_eq!(con.getch().unwrap(), 0x82);
        assert_eq!(con.getch().unwrap(), 0xAC);
        assert!(matches!(con.getch(), Err(ConioError::InputExhausted)));
    }

    #[test]
    fn test_getch_special_keys() {
        let mut con = console();
        con.backend_mut().push_keys([Key::Up, Key::Enter, Key::F(2)]);
        assert_eq!(con.getch().unwrap(), 259);
        assert_eq!(con.getch().unwrap(), 10);
        assert_eq!(con.getch().unwrap(), 266);
    }

    #[test]
    fn test_getche_echoes_printable_only() {
        let mut con = console();
        con.backend_mut().push_keys([
            Key::Char('h'),
            Key::Char('\u{3}'),
            Key::Left,
            Key::Char('é'),
        ]);
        con.getche().unwrap();
        con.getche().unwrap();
        con.getche().unwrap();
        assert_eq!(con.getche().unwrap(), 0xC3);
        assert_eq!(con.getche().unwrap(), 0xA9);
        assert_eq!(con.backend().row_text(0), "hé");
    }

    #[test]
    fn test_getch_does_not_echo() {
        let mut con = console();
        con.backend_mut().push_str("x");
        con.getch().unwrap();
        assert_eq!(con.backend().row_text(0), "");
    }

    #[test]
    fn test_wide_read_drops_partial_bytes() {
        let mut con = console();
        con.backend_mut().push_str("€z");
        assert_eq!(con.getch().unwrap(), 0xE2);
        assert_eq!(con.getwch().unwrap(), Key::Char('z'));
    }

    #[test]
    fn test_getwche() {
        let mut con = console();
        con.backend_mut().push_keys([Key::Char('世'), Key::Esc]);
        assert_eq!(con.getwche().unwrap(), Key::Char('世'));
        assert_eq!(con.getwche().unwrap(), Key::Esc);
        assert_eq!(con.backend().row_text(0), "世");
    }

    #[test]
    fn test_kbhit_does_not_consume() {
        let mut con = console();
        assert!(!con.kbhit().unwrap());
        con.backend_mut().push_str("q");
        assert!(con.kbhit().unwrap());
        assert!(con.kbhit().unwrap());
        assert_eq!(con.backend().pending_input(), 0);
        assert_eq!(con.getch().unwrap(), 'q' as i32);
        assert!(!con.kbhit().unwrap());
    }

    #[test]
    fn test_kbhit_sees_pending_bytes() {
        let mut con = console();
        con.backend_mut().push_str("ß");
        con.getch().unwrap();
        assert!(con.kbhit().unwrap());
    }

    #[test]
    fn test_reads_require_session() {
        let mut con = Console::new(MemoryBackend::new(1, 1));
        assert!(matches!(con.getch(), Err(ConioError::SessionNotActive)));
        assert!(matches!(con.kbhit(), Err(ConioError::SessionNotActive)));
    }
}
