//! Screen buffer
//!
//! This module defines the visible cell grid, the cursor and the current
//! drawing colors. Rows live in a fixed ring so scrolling evicts the top row
//! in O(1) without reallocating.

/// First byte stored verbatim in a cell.
pub const FIRST_PRINTABLE: u8 = 0x20;
/// Last byte stored verbatim in a cell.
pub const LAST_PRINTABLE: u8 = 0x7E;
/// Stand-in for bytes outside the printable range.
pub const PLACEHOLDER: u8 = b'?';

const TAB_WIDTH: u16 = 8;

/// Foreground/background color (RGB)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Basic 8-color ANSI palette, as selected by SGR 30-37 and 40-47.
    /// Indices past the end clamp to the last entry.
    pub fn ansi(index: u16) -> Self {
        const PALETTE: [Color; 8] = [
            Color::new(0, 0, 0),
            Color::new(199, 0, 0),
            Color::new(0, 199, 0),
            Color::new(199, 199, 0),
            Color::new(0, 0, 199),
            Color::new(199, 0, 199),
            Color::new(0, 199, 199),
            Color::new(217, 217, 217),
        ];
        PALETTE[(index as usize).min(PALETTE.len() - 1)]
    }

    /// Convert to crossterm color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// A single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: u8,
    pub fg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(Color::WHITE)
    }
}

impl Cell {
    pub const fn blank(fg: Color) -> Self {
        Self { ch: b' ', fg }
    }

    /// Character to draw for this cell
    pub fn display_char(&self) -> char {
        if (FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&self.ch) {
            self.ch as char
        } else {
            PLACEHOLDER as char
        }
    }
}

/// A single row, always exactly `cols` cells wide
#[derive(Clone, Debug)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cols: u16) -> Self {
        Self {
            cells: vec![Cell::default(); cols as usize],
        }
    }

    pub fn clear(&mut self, fg: Color) {
        self.clear_from(0, fg);
    }

    pub fn clear_from(&mut self, col: usize, fg: Color) {
        for cell in self.cells.iter_mut().skip(col) {
            *cell = Cell::blank(fg);
        }
    }

    /// Row contents as text
    #[allow(dead_code)]
    pub fn text(&self) -> String {
        self.cells.iter().map(Cell::display_char).collect()
    }
}

/// Cursor position (0-indexed)
///
/// `col` may equal `cols` right after a tab reaches the right edge; the next
/// printable byte wraps before it is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub col: u16,
    pub row: u16,
}

/// Visible screen: `rows` x `cols` cells plus cursor and drawing colors
pub struct ScreenBuffer {
    cols: u16,
    rows: u16,
    lines: Vec<Row>,
    /// Ring index of the top visible row
    base: usize,
    pub cursor: Cursor,
    pub fg: Color,
    /// Tracked for SGR 40-47/49 only; never drawn.
    #[allow(dead_code)]
    pub bg: Color,
    dirty: bool,
}

impl ScreenBuffer {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            lines: (0..rows).map(|_| Row::new(cols)).collect(),
            base: 0,
            cursor: Cursor::default(),
            fg: Color::WHITE,
            bg: Color::BLACK,
            dirty: true,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[allow(dead_code)]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    fn slot(&self, row: u16) -> usize {
        (self.base + row as usize) % self.lines.len()
    }

    /// Row `row` counted from the top of the screen
    pub fn row(&self, row: u16) -> &Row {
        &self.lines[self.slot(row)]
    }

    fn row_mut(&mut self, row: u16) -> &mut Row {
        let slot = self.slot(row);
        &mut self.lines[slot]
    }

    /// Rows top to bottom
    pub fn iter_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    #[allow(dead_code)]
    pub fn cell(&self, col: u16, row: u16) -> &Cell {
        &self.row(row).cells[col as usize]
    }

    /// Text of a row with trailing blanks removed
    #[allow(dead_code)]
    pub fn line_text(&self, row: u16) -> String {
        self.row(row).text().trim_end().to_string()
    }

    /// Returns whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Write a byte using the printable-insertion policy
    pub fn put_byte(&mut self, byte: u8) {
        match byte {
            b'\r' => {}
            b'\n' => self.linefeed(),
            b'\t' => self.horizontal_tab(),
            0x08 | 0x7F => self.backspace(),
            _ => self.print(byte),
        }
        self.dirty = true;
    }

    /// Write every byte of `text`
    pub fn put_str(&mut self, text: &str) {
        for byte in text.bytes() {
            self.put_byte(byte);
        }
    }

    /// Write `text` followed by a newline
    pub fn put_line(&mut self, text: &str) {
        self.put_str(text);
        self.put_byte(b'\n');
    }

    fn print(&mut self, byte: u8) {
        let ch = if (FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&byte) {
            byte
        } else {
            PLACEHOLDER
        };

        if self.cursor.col >= self.cols {
            self.linefeed();
        }

        let Cursor { col, row } = self.cursor;
        let fg = self.fg;
        self.row_mut(row).cells[col as usize] = Cell { ch, fg };

        self.cursor.col += 1;
        if self.cursor.col >= self.cols {
            self.linefeed();
        }
    }

    /// Line feed - column 0 of the next row, scrolling at the bottom
    pub fn linefeed(&mut self) {
        self.cursor.col = 0;
        if self.cursor.row + 1 >= self.rows {
            self.scroll_up();
            self.cursor.row = self.rows - 1;
        } else {
            self.cursor.row += 1;
        }
        self.dirty = true;
    }

    /// Evict the top row and append a blank one at the bottom
    pub fn scroll_up(&mut self) {
        let top = self.base;
        self.lines[top].clear(Color::WHITE);
        self.base = (self.base + 1) % self.lines.len();
        self.dirty = true;
    }

    /// Horizontal tab - blank up to the next multiple of 8, stopping at `cols`
    pub fn horizontal_tab(&mut self) {
        let target = (self.cursor.col / TAB_WIDTH + 1) * TAB_WIDTH;
        let fg = self.fg;
        while self.cursor.col < target && self.cursor.col < self.cols {
            let Cursor { col, row } = self.cursor;
            self.row_mut(row).cells[col as usize] = Cell::blank(fg);
            self.cursor.col += 1;
        }
    }

    /// Backspace - step left and blank that cell
    pub fn backspace(&mut self) {
        if self.cursor.col == 0 {
            return;
        }
        self.cursor.col -= 1;
        let Cursor { col, row } = self.cursor;
        let fg = self.fg;
        self.row_mut(row).cells[col as usize] = Cell::blank(fg);
        self.dirty = true;
    }

    /// Set cursor position (1-indexed parameters), clamped to the grid
    pub fn cursor_position(&mut self, row: u16, col: u16) {
        self.cursor.row = row.saturating_sub(1).min(self.rows - 1);
        self.cursor.col = col.saturating_sub(1).min(self.cols - 1);
        self.dirty = true;
    }

    /// Blank the whole screen and home the cursor
    pub fn erase_display(&mut self) {
        for line in &mut self.lines {
            line.clear(Color::WHITE);
        }
        self.cursor = Cursor::default();
        self.dirty = true;
    }

    /// Blank from the cursor column to the end of the row
    pub fn erase_line_from_cursor(&mut self) {
        let Cursor { col, row } = self.cursor;
        let fg = self.fg;
        self.row_mut(row).clear_from(col as usize, fg);
        self.dirty = true;
    }

    /// Blank the whole cursor row
    pub fn erase_line(&mut self) {
        let row = self.cursor.row;
        let fg = self.fg;
        self.row_mut(row).clear(fg);
        self.dirty = true;
    }

    /// Blank the cursor row and return to column 0
    pub fn reset_line(&mut self) {
        self.erase_line();
        self.cursor.col = 0;
    }
}
