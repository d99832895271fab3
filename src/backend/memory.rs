//! In-memory backend
//!
//! A cell grid with a cursor and a scripted key queue. It emulates either
//! native attribute model, so the color reconciliation can be observed cell
//! by cell without a terminal.
//!
//! Writing follows curses `addch` conventions: wide characters take two
//! cells, zero-width characters attach to the previous cell, text wraps at
//! the right edge, and the last row does not scroll.

use std::collections::VecDeque;

use tracing::trace;
use unicode_width::UnicodeWidthChar;

use super::Backend;
use crate::color::{AttributePair, BaseColor, ColorPairRegistry, PackedAttr, PairStyle};
use crate::error::{ConioError, Result};
use crate::input::Key;
use crate::screen::Size;

/// Which native attribute model to emulate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrModel {
    /// Windows console attribute byte
    Packed,
    /// curses color pairs with bold overlay
    Paired,
}

/// Native attribute stored in a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeAttr {
    Packed(PackedAttr),
    Paired(PairStyle),
}

/// How a cell looks on screen, independent of the model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rendition {
    pub fg: BaseColor,
    pub bg: BaseColor,
    /// Foreground intensity (bold overlay or intensity bit)
    pub bold: bool,
    /// Background intensity; only the packed model has one
    pub bright_bg: bool,
}

/// A single cell
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Base character plus any combining marks; empty when blank
    pub grapheme: String,
    /// 1 for normal, 2 for the leading half of a wide char, 0 for the
    /// trailing half
    pub width: u8,
    pub attr: NativeAttr,
}

impl Cell {
    fn blank(attr: NativeAttr) -> Self {
        Self {
            grapheme: String::new(),
            width: 1,
            attr,
        }
    }

    fn continuation(attr: NativeAttr) -> Self {
        Self {
            grapheme: String::new(),
            width: 0,
            attr,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    pub fn is_blank(&self) -> bool {
        self.grapheme.is_empty() || self.grapheme == " "
    }

    /// First character, space when blank
    pub fn c(&self) -> char {
        self.grapheme.chars().next().unwrap_or(' ')
    }
}

/// In-memory backend
pub struct MemoryBackend {
    model: AttrModel,
    cols: u16,
    rows: u16,
    cells: Vec<Vec<Cell>>,
    cursor: (u16, u16),
    cursor_visible: bool,
    current: NativeAttr,
    registry: ColorPairRegistry,
    /// Bytes of an incomplete UTF-8 sequence
    partial: Vec<u8>,
    input: VecDeque<Key>,
    entered: bool,
    flushes: usize,
}

impl MemoryBackend {
    /// Paired-model grid of the given size.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self::with_model(AttrModel::Paired, cols, rows)
    }

    pub fn with_model(model: AttrModel, cols: u16, rows: u16) -> Self {
        let current = Self::normal_attr(model);
        Self {
            model,
            cols,
            rows,
            cells: vec![vec![Cell::blank(current); cols as usize]; rows as usize],
            cursor: (0, 0),
            cursor_visible: true,
            current,
            registry: ColorPairRegistry::new(256),
            partial: Vec::new(),
            input: VecDeque::new(),
            entered: false,
            flushes: 0,
        }
    }

    /// Cap the paired model's pair table.
    pub fn with_max_pairs(mut self, max_pairs: u16) -> Self {
        self.registry = ColorPairRegistry::new(max_pairs);
        self
    }

    fn normal_attr(model: AttrModel) -> NativeAttr {
        match model {
            AttrModel::Packed => NativeAttr::Packed(PackedAttr::NORMAL),
            AttrModel::Paired => NativeAttr::Paired(PairStyle::NORMAL),
        }
    }

    pub fn model(&self) -> AttrModel {
        self.model
    }

    /// Queue keys for subsequent reads.
    pub fn push_keys(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.input.extend(keys);
    }

    /// Queue the characters of a string as keys.
    pub fn push_str(&mut self, text: &str) {
        self.input.extend(text.chars().map(Key::Char));
    }

    /// Keys not yet read.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Simulate a terminal resize. New cells are blank in the normal
    /// rendition; the cursor is clamped.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let blank = Cell::blank(Self::normal_attr(self.model));
        self.cells.resize(rows as usize, vec![blank.clone(); cols as usize]);
        for row in &mut self.cells {
            row.resize(cols as usize, blank.clone());
        }
        self.cols = cols;
        self.rows = rows;
        self.cursor.0 = self.cursor.0.min(cols.saturating_sub(1));
        self.cursor.1 = self.cursor.1.min(rows.saturating_sub(1));
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.cells.get(y as usize)?.get(x as usize)
    }

    /// Text of a row with trailing blanks removed.
    pub fn row_text(&self, y: u16) -> String {
        let Some(row) = self.cells.get(y as usize) else {
            return String::new();
        };
        let mut text = String::new();
        for cell in row {
            if cell.is_continuation() {
                continue;
            }
            if cell.grapheme.is_empty() {
                text.push(' ');
            } else {
                text.push_str(&cell.grapheme);
            }
        }
        text.trim_end().to_string()
    }

    /// Resolve a cell's native attribute to what it looks like.
    pub fn rendition(&self, x: u16, y: u16) -> Option<Rendition> {
        self.cell(x, y).map(|cell| self.render(cell.attr))
    }

    /// Resolve a native attribute to what it looks like.
    pub fn render(&self, attr: NativeAttr) -> Rendition {
        match attr {
            NativeAttr::Packed(packed) => {
                let pair = packed.unpack();
                Rendition {
                    fg: pair.fg.base(),
                    bg: pair.bg.base(),
                    bold: pair.fg.is_bright(),
                    bright_bg: pair.bg.is_bright(),
                }
            }
            NativeAttr::Paired(style) => {
                let (fg, bg) = self
                    .registry
                    .colors(style.handle)
                    .unwrap_or((BaseColor::White, BaseColor::Black));
                Rendition {
                    fg,
                    bg,
                    bold: style.bold,
                    bright_bg: false,
                }
            }
        }
    }

    pub fn current_attr(&self) -> NativeAttr {
        self.current
    }

    pub fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn registry(&self) -> &ColorPairRegistry {
        &self.registry
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Number of synchronization points so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    fn feed_byte(&mut self, b: u8) {
        if self.partial.is_empty() {
            match b {
                b'\n' => return self.newline(),
                b'\r' => {
                    self.cursor.0 = 0;
                    return;
                }
                b'\t' => {
                    let next = (self.cursor.0 / 8 + 1) * 8;
                    self.cursor.0 = next.min(self.cols.saturating_sub(1));
                    return;
                }
                0x08 => {
                    self.cursor.0 = self.cursor.0.saturating_sub(1);
                    return;
                }
                _ if b < 0x20 || b == 0x7F => return,
                _ if b < 0x80 => return self.put_char(b as char),
                _ => {}
            }
        }

        self.partial.push(b);
        match std::str::from_utf8(&self.partial) {
            Ok(s) => {
                let chars: Vec<char> = s.chars().collect();
                self.partial.clear();
                for ch in chars {
                    self.put_char(ch);
                }
            }
            Err(e) if e.error_len().is_some() => {
                // Not a valid sequence: show a replacement and resync.
                self.partial.clear();
                self.put_char(char::REPLACEMENT_CHARACTER);
            }
            Err(_) => {}
        }
    }

    fn newline(&mut self) {
        self.cursor.0 = 0;
        if self.cursor.1 + 1 < self.rows {
            self.cursor.1 += 1;
        }
    }

    fn put_char(&mut self, ch: char) {
        if self.cols == 0 || self.rows == 0 {
            return;
        }
        let width = ch.width().unwrap_or(0) as u16;

        if width == 0 {
            let (col, row) = self.cursor;
            if col > 0 {
                self.cells[row as usize][col as usize - 1].grapheme.push(ch);
            }
            return;
        }

        if self.cursor.0 + width > self.cols {
            self.newline();
        }
        let (col, row) = (self.cursor.0 as usize, self.cursor.1 as usize);
        if col + width as usize > self.cols as usize {
            return;
        }

        self.handle_wide_char_overwrite(row, col);

        let attr = self.current;
        self.cells[row][col] = Cell {
            grapheme: ch.to_string(),
            width: width as u8,
            attr,
        };
        if width == 2 {
            self.cells[row][col + 1] = Cell::continuation(attr);
        }

        self.cursor.0 += width;
        if self.cursor.0 >= self.cols {
            self.newline();
        }
    }

    fn handle_wide_char_overwrite(&mut self, row: usize, col: usize) {
        let attr = self.current;
        let cols = self.cols as usize;
        let line = &mut self.cells[row];

        // Overwriting the right half of a wide char blanks the left half.
        if col > 0 && line[col].is_continuation() {
            line[col - 1] = Cell::blank(attr);
        }
        // Overwriting the left half blanks the right half.
        if line[col].width == 2 && col + 1 < cols {
            line[col + 1] = Cell::blank(attr);
        }
    }
}

impl Backend for MemoryBackend {
    fn claims_terminal(&self) -> bool {
        false
    }

    fn enter(&mut self, cursor_visible: bool) -> Result<()> {
        self.registry.reset();
        self.current = Self::normal_attr(self.model);
        self.cursor_visible = cursor_visible;
        self.entered = true;
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        self.current = Self::normal_attr(self.model);
        self.cursor_visible = true;
        self.entered = false;
        Ok(())
    }

    fn set_attributes(&mut self, pair: AttributePair) -> Result<()> {
        self.current = match self.model {
            AttrModel::Packed => NativeAttr::Packed(PackedAttr::pack(pair)),
            AttrModel::Paired => NativeAttr::Paired(self.registry.style_for(pair)?),
        };
        trace!("Memory attribute {:?}", self.current);
        Ok(())
    }

    fn reset_attributes(&mut self) -> Result<()> {
        self.current = Self::normal_attr(self.model);
        Ok(())
    }

    fn move_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        if x >= self.cols || y >= self.rows {
            return Err(ConioError::InvalidArgument(format!(
                "position ({}, {}) outside {}x{} grid",
                x, y, self.cols, self.rows
            )));
        }
        self.partial.clear();
        self.cursor = (x, y);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let blank = Cell::blank(self.current);
        for row in &mut self.cells {
            for cell in row.iter_mut() {
                *cell = blank.clone();
            }
        }
        self.partial.clear();
        self.cursor = (0, 0);
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        self.cursor_visible = visible;
        Ok(())
    }

    fn size(&self) -> Option<Size> {
        if self.cols == 0 || self.rows == 0 {
            None
        } else {
            Some(Size {
                cols: self.cols,
                rows: self.rows,
            })
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &b in bytes {
            self.feed_byte(b);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn read_key(&mut self) -> Result<Key> {
        self.input.pop_front().ok_or(ConioError::InputExhausted)
    }

    fn try_read_key(&mut self) -> Result<Option<Key>> {
        Ok(self.input.pop_front())
    }
}
