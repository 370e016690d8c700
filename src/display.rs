use heapless::String as HString;

pub const WIDTH: usize = 80;
pub const HEIGHT: usize = 25;

pub const DEFAULT_ATTRIBUTE: u8 = 0x0F;
pub const HIGHLIGHT_ATTRIBUTE: u8 = 0x70;

// Code page 437 single-line box glyphs.
const BOX_TOP_LEFT: u8 = 0xDA;
const BOX_TOP_RIGHT: u8 = 0xBF;
const BOX_BOTTOM_LEFT: u8 = 0xC0;
const BOX_BOTTOM_RIGHT: u8 = 0xD9;
const BOX_HORIZONTAL: u8 = 0xC4;
const BOX_VERTICAL: u8 = 0xB3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cell {
    pub character: u8,
    pub attribute: u8,
}

impl Cell {
    pub const fn blank(attribute: u8) -> Self {
        Self { character: b' ', attribute }
    }

    pub const fn to_vga(self) -> u16 {
        (self.attribute as u16) << 8 | self.character as u16
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub row: usize,
    pub col: usize,
}

pub trait CellSink {
    fn write_cell(&mut self, row: usize, col: usize, cell: Cell);

    fn set_cursor(&mut self, _pos: CursorPosition) {}
}

pub struct Display {
    cells: [[Cell; WIDTH]; HEIGHT],
    cursor: CursorPosition,
    attribute: u8,
    dirty: [bool; HEIGHT],
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Display {
    pub const fn new() -> Self {
        Self {
            cells: [[Cell::blank(DEFAULT_ATTRIBUTE); WIDTH]; HEIGHT],
            cursor: CursorPosition { row: 0, col: 0 },
            attribute: DEFAULT_ATTRIBUTE,
            dirty: [true; HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        let blank = Cell::blank(self.attribute);
        for row in self.cells.iter_mut() {
            row.fill(blank);
        }
        self.dirty = [true; HEIGHT];
        self.cursor = CursorPosition::default();
    }

    pub fn cursor_position(&self) -> CursorPosition {
        self.cursor
    }

    pub fn move_cursor_to(&mut self, row: usize, col: usize) {
        self.cursor.row = row.min(HEIGHT - 1);
        self.cursor.col = col.min(WIDTH - 1);
    }

    pub fn attribute(&self) -> u8 {
        self.attribute
    }

    pub fn set_attribute(&mut self, attribute: u8) {
        self.attribute = attribute;
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row)?.get(col).copied()
    }

    /// Row contents as text, trailing blanks trimmed. Glyphs outside
    /// printable ASCII (box drawing) read back as `?`.
    pub fn row_text(&self, row: usize) -> HString<WIDTH> {
        let mut out = HString::new();
        if let Some(cells) = self.cells.get(row) {
            for cell in cells {
                let ch = match cell.character {
                    c @ 0x20..=0x7E => c as char,
                    _ => '?',
                };
                let _ = out.push(ch);
            }
        }
        while out.ends_with(' ') {
            out.pop();
        }
        out
    }

    fn set_cell(&mut self, row: usize, col: usize, character: u8, attribute: u8) {
        if row >= HEIGHT || col >= WIDTH {
            return;
        }
        self.cells[row][col] = Cell { character, attribute };
        self.dirty[row] = true;
    }

    pub fn put_char(&mut self, c: u8) {
        if c == b'\n' {
            self.newline();
            return;
        }
        let CursorPosition { row, col } = self.cursor;
        self.set_cell(row, col, c, self.attribute);
        self.cursor.col += 1;
        if self.cursor.col >= WIDTH {
            self.newline();
        }
    }

    pub fn write(&mut self, s: &str) {
        for byte in s.bytes() {
            self.put_char(byte);
        }
    }

    pub fn write_line(&mut self, s: &str) {
        self.write(s);
        self.put_char(b'\n');
    }

    pub fn newline(&mut self) {
        self.cursor.col = 0;
        self.cursor.row += 1;
        if self.cursor.row >= HEIGHT {
            self.scroll_up();
            self.cursor.row = HEIGHT - 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.cells.copy_within(1.., 0);
        self.cells[HEIGHT - 1] = [Cell::blank(self.attribute); WIDTH];
        self.dirty = [true; HEIGHT];
    }

    pub fn backspace_at_cursor(&mut self) {
        if self.cursor.col == 0 {
            return;
        }
        self.cursor.col -= 1;
        let CursorPosition { row, col } = self.cursor;
        self.set_cell(row, col, b' ', self.attribute);
    }

    pub fn write_at(&mut self, row: usize, col: usize, text: &str) {
        self.write_at_attr(row, col, text, self.attribute);
    }

    pub fn write_at_attr(&mut self, row: usize, col: usize, text: &str, attribute: u8) {
        if row >= HEIGHT {
            return;
        }
        for (offset, byte) in text.bytes().enumerate() {
            let c = col.saturating_add(offset);
            if c >= WIDTH {
                break;
            }
            self.set_cell(row, c, byte, attribute);
        }
    }

    pub fn fill_at(&mut self, row: usize, col: usize, len: usize, ch: u8) {
        self.fill_at_attr(row, col, len, ch, self.attribute);
    }

    pub fn fill_at_attr(&mut self, row: usize, col: usize, len: usize, ch: u8, attribute: u8) {
        if row >= HEIGHT || col >= WIDTH {
            return;
        }
        let end = col.saturating_add(len).min(WIDTH);
        for c in col..end {
            self.set_cell(row, c, ch, attribute);
        }
    }

    pub fn write_field(&mut self, row: usize, col: usize, len: usize, text: &str) {
        self.fill_at(row, col, len, b' ');
        let end = text.len().min(len);
        self.write_at(row, col, &text[..end]);
    }

    pub fn draw_box(&mut self, top: usize, left: usize, bottom: usize, right: usize, title: Option<&str>) {
        let top = top.min(HEIGHT - 1);
        let bottom = bottom.min(HEIGHT - 1);
        let left = left.min(WIDTH - 1);
        let right = right.min(WIDTH - 1);
        if bottom <= top || right <= left {
            return;
        }
        let attr = self.attribute;
        for col in left + 1..right {
            self.set_cell(top, col, BOX_HORIZONTAL, attr);
            self.set_cell(bottom, col, BOX_HORIZONTAL, attr);
        }
        for row in top + 1..bottom {
            self.set_cell(row, left, BOX_VERTICAL, attr);
            self.set_cell(row, right, BOX_VERTICAL, attr);
        }
        self.set_cell(top, left, BOX_TOP_LEFT, attr);
        self.set_cell(top, right, BOX_TOP_RIGHT, attr);
        self.set_cell(bottom, left, BOX_BOTTOM_LEFT, attr);
        self.set_cell(bottom, right, BOX_BOTTOM_RIGHT, attr);

        if let Some(title) = title {
            // " title " inset two cells from the corner, never over it.
            let start = left + 2;
            if start + 2 >= right {
                return;
            }
            let room = right - start - 2;
            let shown = &title[..title.len().min(room)];
            self.set_cell(top, start, b' ', attr);
            self.write_at_attr(top, start + 1, shown, attr);
            self.set_cell(top, start + 1 + shown.len(), b' ', attr);
        }
    }

    pub fn draw_button(&mut self, row: usize, col: usize, label: &str, width: usize, selected: bool) {
        let width = width.max(label.len() + 2);
        let (open, close, attr) = if selected {
            (b'<', b'>', HIGHLIGHT_ATTRIBUTE)
        } else {
            (b'[', b']', self.attribute)
        };
        let inner = width - 2;
        let pad = (inner - label.len()) / 2;
        self.set_cell(row, col, open, attr);
        self.fill_at_attr(row, col + 1, inner, b' ', attr);
        self.write_at_attr(row, col + 1 + pad, label, attr);
        self.set_cell(row, col + width - 1, close, attr);
    }

    pub fn present(&mut self, sink: &mut impl CellSink) {
        for (row, cells) in self.cells.iter().enumerate() {
            if !self.dirty[row] {
                continue;
            }
            for (col, cell) in cells.iter().enumerate() {
                sink.write_cell(row, col, *cell);
            }
        }
        self.dirty = [false; HEIGHT];
        sink.set_cursor(self.cursor);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct RecordingSink {
        pub cells: [[u16; WIDTH]; HEIGHT],
        pub writes: usize,
        pub cursor: CursorPosition,
    }

    impl RecordingSink {
        pub(crate) fn new() -> Self {
            Self { cells: [[0; WIDTH]; HEIGHT], writes: 0, cursor: CursorPosition::default() }
        }
    }

    impl CellSink for RecordingSink {
        fn write_cell(&mut self, row: usize, col: usize, cell: Cell) {
            self.cells[row][col] = cell.to_vga();
            self.writes += 1;
        }

        fn set_cursor(&mut self, pos: CursorPosition) {
            self.cursor = pos;
        }
    }

    #[test]
    fn test_clear_resets_cursor_and_cells() {
        let mut d = Display::new();
        d.write("hello");
        d.clear();
        assert_eq!(d.cursor_position(), CursorPosition { row: 0, col: 0 });
        assert_eq!(d.row_text(0).as_str(), "");
    }

    #[test]
    fn test_put_char_wraps_at_right_edge() {
        let mut d = Display::new();
        for _ in 0..WIDTH {
            d.put_char(b'x');
        }
        assert_eq!(d.cursor_position(), CursorPosition { row: 1, col: 0 });
        d.put_char(b'\n');
        assert_eq!(d.cursor_position(), CursorPosition { row: 2, col: 0 });
    }

    #[test]
    fn test_scroll_pins_cursor_to_last_row() {
        let mut d = Display::new();
        d.write_line("first");
        for _ in 1..HEIGHT - 1 {
            d.put_char(b'\n');
        }
        d.write("last");
        assert_eq!(d.cursor_position().row, HEIGHT - 1);
        assert_eq!(d.row_text(0).as_str(), "first");

        d.put_char(b'\n');
        assert_eq!(d.cursor_position(), CursorPosition { row: HEIGHT - 1, col: 0 });
        assert_eq!(d.row_text(0).as_str(), "");
        assert_eq!(d.row_text(HEIGHT - 2).as_str(), "last");
        assert_eq!(d.row_text(HEIGHT - 1).as_str(), "");
    }

    #[test]
    fn test_write_at_clips_without_wrapping() {
        let mut d = Display::new();
        d.write_at(3, WIDTH - 3, "abcdef");
        assert_eq!(d.row_text(3).len(), WIDTH);
        assert_eq!(d.cell(3, WIDTH - 1).map(|c| c.character), Some(b'c'));
        assert_eq!(d.row_text(4).as_str(), "");
        d.write_at(HEIGHT, 0, "ignored");
        d.fill_at(0, WIDTH + 5, 3, b'#');
        assert_eq!(d.row_text(0).as_str(), "");
    }

    #[test]
    fn test_fill_at_clips() {
        let mut d = Display::new();
        d.fill_at(2, WIDTH - 2, 10, b'#');
        assert_eq!(d.cell(2, WIDTH - 2).map(|c| c.character), Some(b'#'));
        assert_eq!(d.cell(2, WIDTH - 1).map(|c| c.character), Some(b'#'));
        assert_eq!(d.cell(3, 0).map(|c| c.character), Some(b' '));
    }

    #[test]
    fn test_backspace_stays_on_row() {
        let mut d = Display::new();
        d.move_cursor_to(5, 1);
        d.put_char(b'z');
        d.backspace_at_cursor();
        assert_eq!(d.cursor_position(), CursorPosition { row: 5, col: 1 });
        d.backspace_at_cursor();
        d.backspace_at_cursor();
        assert_eq!(d.cursor_position(), CursorPosition { row: 5, col: 0 });
    }

    #[test]
    fn test_draw_box_clamps_and_titles() {
        let mut d = Display::new();
        d.draw_box(0, 0, 100, 200, Some("Menu"));
        assert_eq!(d.cell(0, 0).map(|c| c.character), Some(BOX_TOP_LEFT));
        assert_eq!(d.cell(HEIGHT - 1, WIDTH - 1).map(|c| c.character), Some(BOX_BOTTOM_RIGHT));
        assert_eq!(d.cell(10, 0).map(|c| c.character), Some(BOX_VERTICAL));
        assert_eq!(&d.row_text(0)[2..8], " Menu ");
    }

    #[test]
    fn test_draw_button_framing() {
        let mut d = Display::new();
        d.draw_button(1, 0, "7", 7, false);
        d.draw_button(2, 0, "ENT", 7, true);
        assert_eq!(d.row_text(1).as_str(), "[  7  ]");
        assert_eq!(d.row_text(2).as_str(), "< ENT >");
        assert_eq!(d.cell(2, 3).map(|c| c.attribute), Some(HIGHLIGHT_ATTRIBUTE));
    }

    #[test]
    fn test_present_only_sends_dirty_rows() {
        let mut d = Display::new();
        let mut sink = RecordingSink::new();
        d.present(&mut sink);
        assert_eq!(sink.writes, WIDTH * HEIGHT);

        d.write_at(4, 0, "A");
        d.move_cursor_to(4, 1);
        d.present(&mut sink);
        assert_eq!(sink.writes, WIDTH * HEIGHT + WIDTH);
        assert_eq!(sink.cells[4][0], 0x0F41);
        assert_eq!(sink.cursor, CursorPosition { row: 4, col: 1 });
    }
}
