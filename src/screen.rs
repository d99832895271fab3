//! Cursor and screen primitives

use tracing::trace;

use crate::backend::Backend;
use crate::error::Result;
use crate::session::Console;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Reported when the size cannot be determined.
    pub const UNKNOWN: Size = Size { cols: 0, rows: 0 };

    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }

    #[inline]
    pub const fn is_unknown(self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

impl<B: Backend> Console<B> {
    /// Move the cursor to column `x`, row `y` (origin top-left).
    pub fn move_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        self.ensure_active()?;
        trace!("Move cursor to ({}, {})", x, y);
        self.backend.move_cursor(x, y)?;
        self.sync()
    }

    /// Classic `gotoxy`.
    pub fn gotoxy(&mut self, x: u16, y: u16) -> Result<()> {
        self.move_cursor(x, y)
    }

    /// Blank the screen with the current colors and home the cursor.
    pub fn clear_screen(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.backend.clear()?;
        self.sync()
    }

    /// Classic `clrscr`.
    pub fn clrscr(&mut self) -> Result<()> {
        self.clear_screen()
    }

    pub fn show_cursor(&mut self, visible: bool) -> Result<()> {
        self.ensure_active()?;
        self.backend.set_cursor_visible(visible)?;
        self.state.cursor_visible = visible;
        self.sync()
    }

    /// Classic `showcursor`.
    pub fn showcursor(&mut self, visible: bool) -> Result<()> {
        self.show_cursor(visible)
    }

    /// Current dimensions, [`Size::UNKNOWN`] if they cannot be determined.
    ///
    /// Re-queried on every call, so a resize is observed immediately.
    pub fn size(&self) -> Result<Size> {
        self.ensure_active()?;
        Ok(self.backend.size().unwrap_or(Size::UNKNOWN))
    }

    /// Width in columns, 0 if unknown.
    pub fn query_width(&self) -> Result<u16> {
        Ok(self.size()?.cols)
    }

    /// Height in rows, 0 if unknown.
    pub fn query_height(&self) -> Result<u16> {
        Ok(self.size()?.rows)
    }

    /// Classic `getwidth`.
    pub fn getwidth(&self) -> Result<u16> {
        self.query_width()
    }

    /// Classic `getheight`.
    pub fn getheight(&self) -> Result<u16> {
        self.query_height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::color::{BaseColor, Color};
    use crate::error::ConioError;

    fn console(cols: u16, rows: u16) -> Console<MemoryBackend> {
        Console::open(MemoryBackend::new(cols, rows)).unwrap()
    }

    #[test]
    fn test_size_area() {
        assert_eq!(Size { cols: 80, rows: 24 }.area(), 1920);
        assert!(Size::UNKNOWN.is_unknown());
    }

    #[test]
    fn test_move_cursor() {
        let mut con = console(10, 5);
        con.gotoxy(3, 4).unwrap();
        assert_eq!(con.backend().cursor(), (3, 4));
        assert!(matches!(
            con.move_cursor(10, 0),
            Err(ConioError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_clear_screen() {
        let mut con = console(4, 2);
        con.backend_mut().write_str("abcdefg").unwrap();
        con.set_background(Color::Magenta).unwrap();
        con.clrscr().unwrap();
        assert_eq!(con.backend().cursor(), (0, 0));
        for y in 0..2 {
            assert_eq!(con.backend().row_text(y), "");
            for x in 0..4 {
                assert_eq!(con.backend().rendition(x, y).unwrap().bg, BaseColor::Magenta);
            }
        }
    }

    #[test]
    fn test_show_cursor() {
        let mut con = console(4, 2);
        con.showcursor(false).unwrap();
        assert!(!con.backend().cursor_visible());
        assert!(!con.state().cursor_visible);
        con.show_cursor(true).unwrap();
        assert!(con.backend().cursor_visible());
    }

    #[test]
    fn test_dimensions_follow_resize() {
        let mut con = console(80, 25);
        assert_eq!(con.getwidth().unwrap(), 80);
        assert_eq!(con.getheight().unwrap(), 25);
        con.backend_mut().resize(100, 40);
        assert_eq!(con.query_width().unwrap(), 100);
        assert_eq!(con.query_height().unwrap(), 40);
    }

    #[test]
    fn test_unknown_size_is_zero() {
        let mut con = console(80, 25);
        con.backend_mut().resize(0, 0);
        assert_eq!(con.size().unwrap(), Size::UNKNOWN);
        assert_eq!(con.getwidth().unwrap(), 0);
    }

    #[test]
    fn test_inactive_session() {
        let con = Console::new(MemoryBackend::new(4, 2));
        assert!(matches!(con.getwidth(), Err(ConioError::SessionNotActive)));
    }
}
