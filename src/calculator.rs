use core::fmt::{self, Write};

use heapless::String as HString;
use heapless::Vec as HVec;

use crate::app::{AppContext, AppSignal, Application};
use crate::display::Display;
use crate::keyboard::{InputEvent, SpecialKey};
use crate::status::StatusText;

pub const INPUT_CAPACITY: usize = 63;
const TAPE_LEN: usize = 5;

const INPUT_ROW: usize = 4;
const INPUT_COL: usize = 5;
const RESULT_ROW: usize = 6;
const RESULT_COL: usize = 3;
const RESULT_WIDTH: usize = 60;
const KEYPAD_TOP: usize = 9;
const KEYPAD_LEFT: usize = 6;
const KEY_WIDTH: usize = 8;
const KEY_PITCH: usize = 10;
const TAPE_ROW: usize = 9;
const TAPE_COL: usize = 50;
const TAPE_WIDTH: usize = 28;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CalcError {
    Parse,
    DivideByZero,
}

impl StatusText for CalcError {
    fn as_str(&self) -> &'static str {
        match self {
            CalcError::Parse => "Error: parse",
            CalcError::DivideByZero => "Error: div by 0",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Input(&'static str),
    Backspace,
    Evaluate,
}

impl Key {
    fn label(&self) -> &'static str {
        match self {
            Key::Input(text) => *text,
            Key::Backspace => "BKSP",
            Key::Evaluate => "ENT",
        }
    }
}

pub const KEYPAD: [[Key; 4]; 4] = [
    [Key::Input("7"), Key::Input("8"), Key::Input("9"), Key::Input("/")],
    [Key::Input("4"), Key::Input("5"), Key::Input("6"), Key::Input("*")],
    [Key::Input("1"), Key::Input("2"), Key::Input("3"), Key::Input("-")],
    [Key::Input("0"), Key::Backspace, Key::Evaluate, Key::Input("+")],
];

const HOME_KEY: (usize, usize) = (3, 2);

fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/')
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn operand(&mut self) -> Result<i64, CalcError> {
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        let start = self.pos;
        let mut value: i64 = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            value = value * 10 + i64::from(b - b'0');
            if value > i64::from(i32::MAX) + 1 {
                return Err(CalcError::Parse);
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(CalcError::Parse);
        }
        let value = if negative { -value } else { value };
        i32::try_from(value).map(i64::from).map_err(|_| CalcError::Parse)
    }
}

pub fn parse_expression(expr: &str) -> Result<(i64, char, i64), CalcError> {
    let mut cur = Cursor { bytes: expr.as_bytes(), pos: 0 };
    cur.skip_spaces();
    let a = cur.operand()?;
    cur.skip_spaces();
    let op = match cur.peek() {
        Some(b) if is_operator(b as char) => b as char,
        _ => return Err(CalcError::Parse),
    };
    cur.pos += 1;
    cur.skip_spaces();
    let b = cur.operand()?;
    cur.skip_spaces();
    if cur.peek().is_some() {
        return Err(CalcError::Parse);
    }
    Ok((a, op, b))
}

pub fn evaluate(expr: &str) -> Result<i64, CalcError> {
    let (a, op, b) = parse_expression(expr)?;
    match op {
        '+' => Ok(a + b),
        '-' => Ok(a - b),
        '*' => Ok(a * b),
        _ => {
            if b == 0 {
                Err(CalcError::DivideByZero)
            } else {
                Ok(a / b)
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CalcState {
    Editing,
    ExitToMenu,
}

pub struct Calculator {
    state: CalcState,
    input: HString<INPUT_CAPACITY>,
    selected: (usize, usize),
    result: HString<RESULT_WIDTH>,
    tape: HVec<HString<TAPE_WIDTH>, TAPE_LEN>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            state: CalcState::Editing,
            input: HString::new(),
            selected: HOME_KEY,
            result: HString::new(),
            tape: HVec::new(),
        }
    }

    pub fn state(&self) -> CalcState {
        self.state
    }

    pub fn input(&self) -> &str {
        self.input.as_str()
    }

    pub fn result(&self) -> &str {
        self.result.as_str()
    }

    pub fn selected(&self) -> (usize, usize) {
        self.selected
    }

    fn draw_screen(&self, d: &mut Display) {
        d.clear();
        d.draw_box(0, 0, 24, 79, Some("Calculator"));
        d.write_at(2, 3, "Format: <int><op><int>   Example: 12+34   Ops: + - * /");
        d.write_at(INPUT_ROW, 3, "> ");
        d.write_at(TAPE_ROW - 1, TAPE_COL, "Recent");
        d.write_at(21, 3, "w/a/s/d select key   Enter/Space press key   Backspace erase");
        d.write_at(22, 3, "c clear line   Esc back to menu");
        for row in 0..4 {
            for col in 0..4 {
                self.draw_key(d, row, col);
            }
        }
        self.draw_input(d);
        self.draw_result(d);
        self.draw_tape(d);
    }

    fn draw_key(&self, d: &mut Display, row: usize, col: usize) {
        let key = KEYPAD[row][col];
        d.draw_button(
            KEYPAD_TOP + row * 2,
            KEYPAD_LEFT + col * KEY_PITCH,
            key.label(),
            KEY_WIDTH,
            self.selected == (row, col),
        );
    }

    fn draw_input(&self, d: &mut Display) {
        d.write_field(INPUT_ROW, INPUT_COL, INPUT_CAPACITY + 1, self.input.as_str());
        d.move_cursor_to(INPUT_ROW, INPUT_COL + self.input.len());
    }

    fn draw_result(&self, d: &mut Display) {
        d.write_field(RESULT_ROW, RESULT_COL, RESULT_WIDTH, self.result.as_str());
    }

    fn draw_tape(&self, d: &mut Display) {
        for row in 0..TAPE_LEN {
            let text = self.tape.get(row).map(|line| line.as_str()).unwrap_or("");
            d.write_field(TAPE_ROW + row, TAPE_COL, TAPE_WIDTH, text);
        }
    }

    fn move_selection(&mut self, d: &mut Display, d_row: isize, d_col: isize) {
        let (row, col) = self.selected;
        let next_row = row.saturating_add_signed(d_row).min(3);
        let next_col = col.saturating_add_signed(d_col).min(3);
        if (next_row, next_col) == self.selected {
            return;
        }
        self.selected = (next_row, next_col);
        self.draw_key(d, row, col);
        self.draw_key(d, next_row, next_col);
        d.move_cursor_to(INPUT_ROW, INPUT_COL + self.input.len());
    }

    fn push_str(&mut self, d: &mut Display, text: &str) {
        if self.input.push_str(text).is_ok() {
            self.draw_input(d);
        }
    }

    fn erase(&mut self, d: &mut Display) {
        if self.input.pop().is_some() {
            self.draw_input(d);
        }
    }

    fn clear_input(&mut self, d: &mut Display) {
        self.input.clear();
        self.draw_input(d);
    }

    fn activate(&mut self, d: &mut Display) {
        let (row, col) = self.selected;
        match KEYPAD[row][col] {
            Key::Input(text) => self.push_str(d, text),
            Key::Backspace => self.erase(d),
            Key::Evaluate => self.run(d),
        }
    }

    fn run(&mut self, d: &mut Display) {
        let outcome = evaluate(self.input.as_str());
        self.result.clear();
        match &outcome {
            Ok(value) => {
                let _ = write!(self.result, "= {}", value);
                klog!("calc: {} = {}", self.input, value);
            }
            Err(err) => {
                let _ = self.result.push_str(err.as_str());
                klog!("calc: {:?} -> {}", self.input.as_str(), err.as_str());
            }
        }
        match tape_entry(self.input.as_str(), &outcome) {
            Ok(entry) => {
                if self.tape.is_full() {
                    self.tape.remove(0);
                }
                let _ = self.tape.push(entry);
            }
            Err(_) => klog!("calc: tape entry does not fit"),
        }
        self.input.clear();
        self.draw_input(d);
        self.draw_result(d);
        self.draw_tape(d);
    }
}

// The outcome always fits; a long expression keeps its tail behind a `<`.
fn tape_entry(expr: &str, outcome: &Result<i64, CalcError>) -> Result<HString<TAPE_WIDTH>, fmt::Error> {
    let mut suffix = HString::<TAPE_WIDTH>::new();
    match outcome {
        Ok(value) => write!(suffix, " = {}", value)?,
        Err(err) => write!(suffix, ": {}", err.as_str())?,
    }
    let room = TAPE_WIDTH - suffix.len();
    let mut entry = HString::<TAPE_WIDTH>::new();
    if expr.len() <= room {
        entry.push_str(expr).map_err(|_| fmt::Error)?;
    } else {
        let mut start = expr.len() - (room - 1);
        while !expr.is_char_boundary(start) {
            start += 1;
        }
        entry.push('<').map_err(|_| fmt::Error)?;
        entry.push_str(&expr[start..]).map_err(|_| fmt::Error)?;
    }
    entry.push_str(&suffix).map_err(|_| fmt::Error)?;
    Ok(entry)
}

impl Application for Calculator {
    fn title(&self) -> &'static str {
        "Calculator"
    }

    fn enter(&mut self, ctx: &mut AppContext) {
        *self = Self::new();
        self.draw_screen(ctx.display);
    }

    fn handle_event(&mut self, ctx: &mut AppContext, evt: &InputEvent) -> AppSignal {
        if self.state == CalcState::ExitToMenu {
            return AppSignal::ReturnToMenu;
        }
        let d = &mut *ctx.display;
        match (evt.special, evt.printable) {
            (Some(SpecialKey::Escape), _) => {
                self.state = CalcState::ExitToMenu;
                return AppSignal::ReturnToMenu;
            }
            (Some(SpecialKey::Backspace), _) => self.erase(d),
            (Some(SpecialKey::Enter), _) | (_, Some(' ')) => self.activate(d),
            (_, Some('w')) => self.move_selection(d, -1, 0),
            (_, Some('s')) => self.move_selection(d, 1, 0),
            (_, Some('a')) => self.move_selection(d, 0, -1),
            (_, Some('d')) => self.move_selection(d, 0, 1),
            (_, Some('c')) => self.clear_input(d),
            (_, Some(c)) => {
                let mut buf = [0u8; 4];
                self.push_str(d, c.encode_utf8(&mut buf));
            }
            _ => {}
        }
        AppSignal::Continue
    }
}
