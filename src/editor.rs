use heapless::String as HString;
use heapless::Vec as HVec;

use crate::app::{AppContext, AppSignal, Application};
use crate::display::{Display, HIGHLIGHT_ATTRIBUTE, WIDTH};
use crate::keyboard::{InputEvent, SpecialKey};
use crate::status::{Cancelled, StatusText};
use crate::store::{BlobStore, NotFound, BLOB_CAPACITY, NAME_LEN};

// One byte short of a blob so a terminator would still fit.
pub const BUFFER_CAPACITY: usize = BLOB_CAPACITY - 1;

pub const TEXT_TOP: usize = 2;
pub const TEXT_BOTTOM: usize = 22;
pub const TEXT_LEFT: usize = 2;
pub const TEXT_RIGHT: usize = 77;
const STATUS_ROW: usize = 24;
const STATUS_WIDTH: usize = 56;
const FILE_COL: usize = 58;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Save,
    Open,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Editing,
    Prompt(PromptKind),
    ExitToMenu,
}

/// Where the cursor goes after laying out `byte` at `pos`, or `None` if
/// the byte does not fit in the text region.
pub fn advance(pos: (usize, usize), byte: u8) -> Option<(usize, usize)> {
    let (row, col) = pos;
    if byte == b'\n' {
        return (row < TEXT_BOTTOM).then_some((row + 1, TEXT_LEFT));
    }
    if col < TEXT_RIGHT {
        Some((row, col + 1))
    } else if row < TEXT_BOTTOM {
        Some((row + 1, TEXT_LEFT))
    } else {
        None
    }
}

pub fn cursor_after(bytes: &[u8]) -> (usize, usize) {
    let mut pos = (TEXT_TOP, TEXT_LEFT);
    for &byte in bytes {
        match advance(pos, byte) {
            Some(next) => pos = next,
            None => break,
        }
    }
    pos
}

fn is_text_byte(byte: u8) -> bool {
    byte == b'\n' || (0x20..0x7F).contains(&byte)
}

pub struct Editor {
    mode: EditorMode,
    buffer: HVec<u8, BUFFER_CAPACITY>,
    row: usize,
    col: usize,
    prompt: HString<NAME_LEN>,
    file_name: HString<NAME_LEN>,
    status: HString<STATUS_WIDTH>,
    dirty: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            mode: EditorMode::Editing,
            buffer: HVec::new(),
            row: TEXT_TOP,
            col: TEXT_LEFT,
            prompt: HString::new(),
            file_name: HString::new(),
            status: HString::new(),
            dirty: false,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn status(&self) -> &str {
        self.status.as_str()
    }

    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    fn draw_screen(&self, d: &mut Display) {
        d.clear();
        let header = "Text Editor   F2 Save   F3 Open   Esc Menu";
        d.fill_at_attr(0, 0, WIDTH, b' ', HIGHLIGHT_ATTRIBUTE);
        d.write_at_attr(0, 1, header, HIGHLIGHT_ATTRIBUTE);
        d.draw_box(TEXT_TOP - 1, TEXT_LEFT - 1, TEXT_BOTTOM + 1, TEXT_RIGHT + 1, None);
        self.draw_status(d);
        self.place_cursor(d);
    }

    fn clear_text_region(&self, d: &mut Display) {
        for row in TEXT_TOP..=TEXT_BOTTOM {
            d.fill_at(row, TEXT_LEFT, TEXT_RIGHT - TEXT_LEFT + 1, b' ');
        }
    }

    fn draw_status(&self, d: &mut Display) {
        d.write_field(STATUS_ROW, 0, STATUS_WIDTH, self.status.as_str());
        let mut file: HString<{ WIDTH - FILE_COL }> = HString::new();
        let _ = file.push_str(if self.file_name.is_empty() { "[untitled]" } else { self.file_name.as_str() });
        if self.dirty {
            let _ = file.push_str(" +");
        }
        d.write_field(STATUS_ROW, FILE_COL, WIDTH - FILE_COL, file.as_str());
    }

    fn set_status(&mut self, d: &mut Display, msg: &str) {
        self.status.clear();
        let _ = self.status.push_str(msg);
        self.draw_status(d);
    }

    fn place_cursor(&self, d: &mut Display) {
        match self.mode {
            EditorMode::Prompt(_) => d.move_cursor_to(STATUS_ROW, self.status.len()),
            _ => d.move_cursor_to(self.row, self.col),
        }
    }

    fn insert_byte(&mut self, d: &mut Display, byte: u8) -> bool {
        if self.buffer.is_full() {
            return false;
        }
        let Some(next) = advance((self.row, self.col), byte) else {
            return false;
        };
        if self.buffer.push(byte).is_err() {
            return false;
        }
        if byte != b'\n' {
            d.fill_at(self.row, self.col, 1, byte);
        }
        (self.row, self.col) = next;
        true
    }

    fn backspace(&mut self, d: &mut Display) {
        let Some(removed) = self.buffer.pop() else {
            return;
        };
        if removed == b'\n' {
            (self.row, self.col) = cursor_after(&self.buffer);
            return;
        }
        if self.col > TEXT_LEFT {
            self.col -= 1;
        } else {
            self.row -= 1;
            self.col = TEXT_RIGHT;
        }
        d.fill_at(self.row, self.col, 1, b' ');
    }

    fn mark_dirty(&mut self, d: &mut Display) {
        if !self.dirty {
            self.dirty = true;
            self.draw_status(d);
        }
    }

    fn replace_contents(&mut self, d: &mut Display, bytes: &[u8]) {
        self.buffer.clear();
        (self.row, self.col) = (TEXT_TOP, TEXT_LEFT);
        self.clear_text_region(d);
        for &byte in bytes.iter().filter(|b| is_text_byte(**b)) {
            if !self.insert_byte(d, byte) {
                break;
            }
        }
    }

    fn open_prompt(&mut self, d: &mut Display, kind: PromptKind, store: &BlobStore) {
        self.mode = EditorMode::Prompt(kind);
        self.prompt.clear();
        if kind == PromptKind::Save {
            let _ = self.prompt.push_str(self.file_name.as_str());
        }
        self.draw_prompt(d);
        if kind == PromptKind::Open && !store.is_empty() {
            let mut names: HString<{ WIDTH - FILE_COL }> = HString::new();
            for name in store.names() {
                if names.push_str(name).is_err() || names.push(' ').is_err() {
                    break;
                }
            }
            d.write_field(STATUS_ROW, FILE_COL, WIDTH - FILE_COL, names.as_str());
        }
    }

    fn draw_prompt(&mut self, d: &mut Display) {
        let label = match self.mode {
            EditorMode::Prompt(PromptKind::Save) => "Save as: ",
            _ => "Open: ",
        };
        self.status.clear();
        let _ = self.status.push_str(label);
        let _ = self.status.push_str(self.prompt.as_str());
        d.write_field(STATUS_ROW, 0, STATUS_WIDTH, self.status.as_str());
    }

    fn close_prompt(&mut self, d: &mut Display, msg: &str) {
        self.mode = EditorMode::Editing;
        self.set_status(d, msg);
    }

    fn handle_prompt(&mut self, ctx: &mut AppContext, kind: PromptKind, evt: &InputEvent) {
        let d = &mut *ctx.display;
        match (evt.special, evt.printable) {
            (Some(SpecialKey::Escape), _) => self.close_prompt(d, Cancelled.as_str()),
            (Some(SpecialKey::Backspace), _) => {
                self.prompt.pop();
                self.draw_prompt(d);
            }
            (Some(SpecialKey::Enter), _) => {
                if self.prompt.is_empty() {
                    self.close_prompt(d, Cancelled.as_str());
                    return;
                }
                match kind {
                    PromptKind::Save => self.save(d, ctx.store),
                    PromptKind::Open => self.open(d, ctx.store),
                }
            }
            (_, Some(c)) if c != ' ' => {
                if self.prompt.push(c).is_ok() {
                    self.draw_prompt(d);
                }
            }
            _ => {}
        }
    }

    fn save(&mut self, d: &mut Display, store: &mut BlobStore) {
        let name = self.prompt.clone();
        match store.save(name.as_str(), &self.buffer) {
            Ok(()) => {
                klog!("editor: saved {} ({} bytes)", name, self.buffer.len());
                self.file_name = name;
                self.dirty = false;
                self.close_prompt(d, "Saved");
            }
            Err(err) => {
                klog!("editor: save {} failed: {}", name, err.as_str());
                self.close_prompt(d, err.as_str());
            }
        }
    }

    fn open(&mut self, d: &mut Display, store: &BlobStore) {
        let name = self.prompt.clone();
        let Some(bytes) = store.load(name.as_str()) else {
            klog!("editor: open {} failed: not found", name);
            self.close_prompt(d, NotFound.as_str());
            return;
        };
        self.replace_contents(d, bytes);
        klog!("editor: opened {} ({} of {} bytes shown)", name, self.buffer.len(), bytes.len());
        self.file_name = name;
        self.dirty = false;
        self.close_prompt(d, "Opened");
    }
}

impl Application for Editor {
    fn title(&self) -> &'static str {
        "Text Editor"
    }

    fn enter(&mut self, ctx: &mut AppContext) {
        *self = Self::new();
        self.draw_screen(ctx.display);
    }

    fn handle_event(&mut self, ctx: &mut AppContext, evt: &InputEvent) -> AppSignal {
        match self.mode {
            EditorMode::ExitToMenu => return AppSignal::ReturnToMenu,
            EditorMode::Prompt(kind) => self.handle_prompt(ctx, kind, evt),
            EditorMode::Editing => {
                let d = &mut *ctx.display;
                match (evt.special, evt.printable) {
                    (Some(SpecialKey::Escape), _) => {
                        self.mode = EditorMode::ExitToMenu;
                        return AppSignal::ReturnToMenu;
                    }
                    (Some(SpecialKey::F2), _) => self.open_prompt(d, PromptKind::Save, ctx.store),
                    (Some(SpecialKey::F3), _) => self.open_prompt(d, PromptKind::Open, ctx.store),
                    (Some(SpecialKey::Enter), _) => {
                        if self.insert_byte(d, b'\n') {
                            self.mark_dirty(d);
                        }
                    }
                    (Some(SpecialKey::Backspace), _) => {
                        if !self.buffer.is_empty() {
                            self.backspace(d);
                            self.mark_dirty(d);
                        }
                    }
                    (None, Some(c)) if c.is_ascii() => {
                        if self.insert_byte(d, c as u8) {
                            self.mark_dirty(d);
                        }
                    }
                    _ => {}
                }
            }
        }
        self.place_cursor(ctx.display);
        AppSignal::Continue
    }
}
