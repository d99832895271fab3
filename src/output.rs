//! Text output
//!
//! Every output primitive follows the same sequence: optionally move the
//! cursor, optionally change colors, write, flush. The variants differ
//! only in what they write:
//!
//! | primitive          | payload                         |
//! |--------------------|---------------------------------|
//! | `put_byte_with`    | a single byte                   |
//! | `put_char_with`    | one Unicode scalar, UTF-8 coded |
//! | `print_fmt_with`   | formatted text, bounded buffer  |
//! | `print_utf8_with`  | a UTF-8 string                  |

use std::fmt::{self, Write as _};

use tracing::trace;

use crate::backend::Backend;
use crate::color::{AttributePair, Color};
use crate::error::Result;
use crate::session::Console;

/// Color change requested together with an output call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpec {
    /// Foreground only; the background stays as tracked
    Foreground(Color),
    /// Foreground and background
    Both(Color, Color),
}

/// Where and how an output call writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub position: Option<(u16, u16)>,
    pub colors: Option<ColorSpec>,
}

impl Placement {
    /// Current position, current colors.
    pub const fn here() -> Self {
        Self {
            position: None,
            colors: None,
        }
    }

    pub const fn at(x: u16, y: u16) -> Self {
        Self {
            position: Some((x, y)),
            colors: None,
        }
    }

    pub const fn fg(self, fg: Color) -> Self {
        Self {
            position: self.position,
            colors: Some(ColorSpec::Foreground(fg)),
        }
    }

    pub const fn colors(self, fg: Color, bg: Color) -> Self {
        Self {
            position: self.position,
            colors: Some(ColorSpec::Both(fg, bg)),
        }
    }
}

impl From<(u16, u16)> for Placement {
    fn from((x, y): (u16, u16)) -> Self {
        Placement::at(x, y)
    }
}

/// `fmt::Write` sink that stops at a byte limit, never splitting a
/// character.
struct BoundedBuffer {
    buf: String,
    limit: usize,
    truncated: bool,
}

impl BoundedBuffer {
    fn new(limit: usize) -> Self {
        Self {
            buf: String::with_capacity(limit.min(4096)),
            limit,
            truncated: false,
        }
    }
}

impl fmt::Write for BoundedBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Ok(());
        }
        let room = self.limit - self.buf.len();
        if s.len() <= room {
            self.buf.push_str(s);
            return Ok(());
        }
        let mut end = room;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.buf.push_str(&s[..end]);
        self.truncated = true;
        Ok(())
    }
}

/// Format `args` into at most `limit` bytes.
///
/// Longer output is cut at the last character boundary that fits. The
/// flag reports whether anything was dropped.
pub fn format_bounded(limit: usize, args: fmt::Arguments<'_>) -> (String, bool) {
    let mut sink = BoundedBuffer::new(limit);
    // BoundedBuffer never fails; an error here comes from a Display impl
    // and leaves whatever was formatted so far.
    let _ = sink.write_fmt(args);
    (sink.buf, sink.truncated)
}

impl<B: Backend> Console<B> {
    /// Move and recolor as requested, without flushing.
    fn prepare(&mut self, placement: &Placement) -> Result<()> {
        self.ensure_active()?;
        if let Some((x, y)) = placement.position {
            self.backend.move_cursor(x, y)?;
        }
        let recolored = match placement.colors {
            Some(ColorSpec::Foreground(fg)) => {
                let pair = self.state.colors.with_fg(fg);
                self.apply_colors(pair)
            }
            Some(ColorSpec::Both(fg, bg)) => self.apply_colors(AttributePair::new(fg, bg)),
            None => Ok(()),
        };
        if recolored.is_err() {
            // The move already happened; keep it visible.
            self.sync()?;
        }
        recolored
    }

    // ---- Full forms ----

    /// Write one byte. Bytes of a multi-byte character may be written one
    /// call at a time.
    pub fn put_byte_with(&mut self, placement: &Placement, byte: u8) -> Result<()> {
        self.prepare(placement)?;
        self.backend.write_bytes(&[byte])?;
        self.sync()
    }

    /// Write one character.
    pub fn put_char_with(&mut self, placement: &Placement, ch: char) -> Result<()> {
        self.prepare(placement)?;
        let mut utf8 = [0u8; 4];
        self.backend.write_str(ch.encode_utf8(&mut utf8))?;
        self.sync()
    }

    /// Write formatted text, truncated to the configured buffer. Returns the
    /// number of bytes written.
    pub fn print_fmt_with(&mut self, placement: &Placement, args: fmt::Arguments<'_>) -> Result<usize> {
        self.prepare(placement)?;
        let (text, truncated) = format_bounded(self.config.format_limit(), args);
        if truncated {
            trace!("Formatted output truncated to {} bytes", text.len());
        }
        self.backend.write_str(&text)?;
        self.sync()?;
        Ok(text.len())
    }

    /// Write a UTF-8 string.
    pub fn print_utf8_with(&mut self, placement: &Placement, text: &str) -> Result<()> {
        self.prepare(placement)?;
        self.backend.write_str(text)?;
        self.sync()
    }

    // ---- Byte output ----

    /// Classic `putch`.
    pub fn putch(&mut self, byte: u8) -> Result<()> {
        self.put_byte_with(&Placement::here(), byte)
    }

    pub fn putch_at(&mut self, x: u16, y: u16, byte: u8) -> Result<()> {
        self.put_byte_with(&Placement::at(x, y), byte)
    }

    pub fn putch_at_fg(&mut self, x: u16, y: u16, fg: Color, byte: u8) -> Result<()> {
        self.put_byte_with(&Placement::at(x, y).fg(fg), byte)
    }

    pub fn putch_at_colors(&mut self, x: u16, y: u16, fg: Color, bg: Color, byte: u8) -> Result<()> {
        self.put_byte_with(&Placement::at(x, y).colors(fg, bg), byte)
    }

    // ---- Character output ----

    /// Classic `putwch`.
    pub fn putwch(&mut self, ch: char) -> Result<()> {
        self.put_char_with(&Placement::here(), ch)
    }

    pub fn putwch_at(&mut self, x: u16, y: u16, ch: char) -> Result<()> {
        self.put_char_with(&Placement::at(x, y), ch)
    }

    pub fn putwch_at_fg(&mut self, x: u16, y: u16, fg: Color, ch: char) -> Result<()> {
        self.put_char_with(&Placement::at(x, y).fg(fg), ch)
    }

    pub fn putwch_at_colors(&mut self, x: u16, y: u16, fg: Color, bg: Color, ch: char) -> Result<()> {
        self.put_char_with(&Placement::at(x, y).colors(fg, bg), ch)
    }

    // ---- UTF-8 string output ----

    pub fn print_utf8(&mut self, text: &str) -> Result<()> {
        self.print_utf8_with(&Placement::here(), text)
    }

    pub fn print_utf8_fg(&mut self, fg: Color, text: &str) -> Result<()> {
        self.print_utf8_with(&Placement::here().fg(fg), text)
    }

    pub fn print_utf8_colors(&mut self, fg: Color, bg: Color, text: &str) -> Result<()> {
        self.print_utf8_with(&Placement::here().colors(fg, bg), text)
    }

    pub fn print_utf8_at(&mut self, x: u16, y: u16, text: &str) -> Result<()> {
        self.print_utf8_with(&Placement::at(x, y), text)
    }

    pub fn print_utf8_at_fg(&mut self, x: u16, y: u16, fg: Color, text: &str) -> Result<()> {
        self.print_utf8_with(&Placement::at(x, y).fg(fg), text)
    }

    pub fn print_utf8_at_colors(&mut self, x: u16, y: u16, fg: Color, bg: Color, text: &str) -> Result<()> {
        self.print_utf8_with(&Placement::at(x, y).colors(fg, bg), text)
    }

    // ---- Formatted output ----

    /// Formatted output at the cursor. See also [`cprintf!`](crate::cprintf).
    pub fn printf(&mut self, args: fmt::Arguments<'_>) -> Result<usize> {
        self.print_fmt_with(&Placement::here(), args)
    }

    pub fn printf_fg(&mut self, fg: Color, args: fmt::Arguments<'_>) -> Result<usize> {
        self.print_fmt_with(&Placement::here().fg(fg), args)
    }

    pub fn printf_colors(&mut self, fg: Color, bg: Color, args: fmt::Arguments<'_>) -> Result<usize> {
        self.print_fmt_with(&Placement::here().colors(fg, bg), args)
    }

    pub fn printf_at(&mut self, x: u16, y: u16, args: fmt::Arguments<'_>) -> Result<usize> {
        self.print_fmt_with(&Placement::at(x, y), args)
    }

    pub fn printf_at_fg(&mut self, x: u16, y: u16, fg: Color, args: fmt::Arguments<'_>) -> Result<usize> {
        self.print_fmt_with(&Placement::at(x, y).fg(fg), args)
    }

    pub fn printf_at_colors(
        &mut self,
        x: u16,
        y: u16,
        fg: Color,
        bg: Color,
        args: fmt::Arguments<'_>,
    ) -> Result<usize> {
        self.print_fmt_with(&Placement::at(x, y).colors(fg, bg), args)
    }
}

/// Formatted console output.
///
/// ```no_run
/// # use conio::{cprintf, Console, Color, Placement};
/// # fn demo(con: &mut Console<conio::DefaultBackend>) -> conio::Result<()> {
/// cprintf!(con, "{} items", 3)?;
/// cprintf!(con, at: Placement::at(0, 1).fg(Color::BrightGreen), "done")?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! cprintf {
    ($console:expr, at: $placement:expr, $($arg:tt)*) => {
        $console.print_fmt_with(&$placement, ::std::format_args!($($arg)*))
    };
    ($console:expr, $($arg:tt)*) => {
        $console.print_fmt_with(&$crate::Placement::here(), ::std::format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, TermBackend};
    use crate::color::BaseColor;
    use crate::screen::Size;
    use crate::config::Config;
    use crate::error::ConioError;

    fn console() -> Console<MemoryBackend> {
        Console::open(MemoryBackend::new(40, 10)).unwrap()
    }

    #[test]
    fn test_format_bounded_char_boundary() {
        let (text, truncated) = format_bounded(4, format_args!("ab€"));
        assert_eq!(text, "ab");
        assert!(truncated);

        let (text, truncated) = format_bounded(5, format_args!("ab€"));
        assert_eq!(text, "ab€");
        assert!(!truncated);

        let (text, _) = format_bounded(0, format_args!("x"));
        assert!(text.is_empty());
    }

    #[test]
    fn test_putch_bytes_assemble() {
        let mut con = console();
        for b in "é".bytes() {
            con.putch(b).unwrap();
        }
        assert_eq!(con.backend().row_text(0), "é");
    }

    #[test]
    fn test_putch_at_colors() {
        let mut con = console();
        con.putch_at_colors(5, 5, Color::BrightRed, Color::Black, b'X')
            .unwrap();
        assert_eq!(con.backend().cell(5, 5).unwrap().c(), 'X');
        let r = con.backend().rendition(5, 5).unwrap();
        assert_eq!((r.fg, r.bg, r.bold), (BaseColor::Red, BaseColor::Black, true));
        assert_eq!(con.colors(), AttributePair::new(Color::BrightRed, Color::Black));
    }

    #[test]
    fn test_fg_only_keeps_background() {
        let mut con = console();
        con.set_background(Color::Blue).unwrap();
        con.putwch_at_fg(0, 0, Color::Yellow, '★').unwrap();
        assert_eq!(con.colors(), AttributePair::new(Color::Yellow, Color::Blue));
        assert_eq!(con.backend().rendition(0, 0).unwrap().bg, BaseColor::Blue);
    }

    #[test]
    fn test_print_utf8_variants() {
        let mut con = console();
        con.print_utf8_at(0, 1, "┌──┐").unwrap();
        con.print_utf8_at_colors(0, 2, Color::Cyan, Color::Black, "世界")
            .unwrap();
        con.print_utf8_fg(Color::Green, "!").unwrap();
        assert_eq!(con.backend().row_text(1), "┌──┐");
        assert_eq!(con.backend().row_text(2), "世界!");
        assert_eq!(con.backend().cursor(), (5, 2));
    }

    #[test]
    fn test_printf_counts_bytes() {
        let mut con = console();
        let written = con.printf_at(1, 0, format_args!("{}x{}", 80, 25)).unwrap();
        assert_eq!(written, 5);
        assert_eq!(con.backend().row_text(0), " 80x25");
    }

    #[test]
    fn test_cprintf_macro() {
        let mut con = console();
        cprintf!(con, "n={}", 7).unwrap();
        cprintf!(con, at: Placement::at(0, 3).fg(Color::BrightWhite), "{:>4}", "ok")
            .unwrap();
        assert_eq!(con.backend().row_text(0), "n=7");
        assert_eq!(con.backend().row_text(3), "  ok");
        assert!(con.backend().rendition(2, 3).unwrap().bold);
    }

    #[test]
    fn test_printf_truncates_to_buffer() {
        let config = Config {
            format_buffer_size: 8,
            ..Config::default()
        };
        let mut con = Console::with_config(MemoryBackend::new(40, 2), config);
        con.init().unwrap();
        let written = con.printf(format_args!("{}", "abcdefghijkl")).unwrap();
        assert_eq!(written, 7);
        assert_eq!(con.backend().row_text(0), "abcdefg");
    }

    #[test]
    fn test_failed_move_writes_nothing() {
        let mut con = console();
        assert!(matches!(
            con.print_utf8_at(40, 0, "x"),
            Err(ConioError::InvalidArgument(_))
        ));
        assert_eq!(con.backend().row_text(0), "");
    }

    #[test]
    fn test_output_requires_session() {
        let mut con = Console::new(MemoryBackend::new(4, 1));
        assert!(matches!(con.putwch('a'), Err(ConioError::SessionNotActive)));
    }

    #[test]
    fn test_newline_returns_to_column_zero_on_terminal() {
        let config = Config::default();
        let sink = TermBackend::with_writer(Vec::new(), Size { cols: 80, rows: 24 }, &config);
        let mut con = Console::open(sink).unwrap();
        let start = con.backend().writer().len();
        con.printf(format_args!("ab\ncd")).unwrap();
        assert_eq!(&con.backend().writer()[start..], b"ab\r\ncd");
    }

    #[test]
    fn test_exhausted_pairs_still_sync_move() {
        // Reserved pairs fill 1..=8; a limit of 17 leaves one dynamic pair.
        let mut con = Console::open(MemoryBackend::new(10, 3).with_max_pairs(17)).unwrap();
        con.putch_at_colors(0, 0, Color::Red, Color::Green, b'a')
            .unwrap();

        let flushes = con.backend().flush_count();
        assert!(matches!(
            con.putch_at_colors(4, 2, Color::Blue, Color::Green, b'b'),
            Err(ConioError::PairsExhausted(17))
        ));
        assert_eq!(con.backend().cursor(), (4, 2));
        assert_eq!(con.backend().flush_count(), flushes + 1);
        assert_eq!(con.backend().row_text(2), "");
        assert_eq!(con.colors(), AttributePair::new(Color::Red, Color::Green));
    }
}
