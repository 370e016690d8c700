//! Line calculator for the host: `<a> <op> <b>` per line on stdin.

use std::fmt;
use std::io::{self, BufRead, Write};

const SIGNIFICANT_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
enum LineError {
    TooManyTokens,
    Parse,
    UnknownOp(char),
    DivideByZero,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::TooManyTokens => write!(f, "Error: too many tokens. Try: 3 + 4"),
            LineError::Parse => write!(f, "Parse error. Try 'help'."),
            LineError::UnknownOp(op) => write!(f, "Unknown op '{}'. Use + - * /", op),
            LineError::DivideByZero => write!(f, "Error: division by zero."),
        }
    }
}

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn is_done(&mut self) -> bool {
        self.skip_ws();
        self.rest.is_empty()
    }

    /// Longest prefix of the form `[+-]digits[.digits][e[+-]digits]`.
    fn number(&mut self) -> Option<f64> {
        self.skip_ws();
        let bytes = self.rest.as_bytes();
        let digits_from = |mut i: usize| {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            i
        };
        let mut end = 0;
        if matches!(bytes.first(), Some(b'+' | b'-')) {
            end = 1;
        }
        let int_end = digits_from(end);
        let mut mantissa_digits = int_end - end;
        end = int_end;
        if bytes.get(end) == Some(&b'.') {
            let frac_end = digits_from(end + 1);
            mantissa_digits += frac_end - end - 1;
            end = frac_end;
        }
        if mantissa_digits == 0 {
            return None;
        }
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_end = digits_from(exp);
            if exp_end > exp {
                end = exp_end;
            }
        }
        let value = self.rest[..end].parse().ok()?;
        self.rest = &self.rest[end..];
        Some(value)
    }

    fn any_char(&mut self) -> Option<char> {
        self.skip_ws();
        let ch = self.rest.chars().next()?;
        self.rest = &self.rest[ch.len_utf8()..];
        Some(ch)
    }
}

fn evaluate(line: &str) -> Result<f64, LineError> {
    let mut scan = Scanner::new(line);
    let a = scan.number().ok_or(LineError::Parse)?;
    let op = scan.any_char().ok_or(LineError::Parse)?;
    let b = scan.number().ok_or(LineError::Parse)?;
    if !scan.is_done() {
        return Err(LineError::TooManyTokens);
    }
    match op {
        '+' => Ok(a + b),
        '-' => Ok(a - b),
        '*' | 'x' | 'X' => Ok(a * b),
        '/' if b == 0.0 => Err(LineError::DivideByZero),
        '/' => Ok(a / b),
        other => Err(LineError::UnknownOp(other)),
    }
}

/// `printf("%.*g")`: shortest of fixed or exponent form, trailing zeros dropped.
fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let sci = format!("{:.*e}", digits - 1, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Enter: <a> <op> <b>  where op in + - * /")?;
    writeln!(out, "Examples: 3 + 4")?;
    writeln!(out, "         12.5 * 2")?;
    writeln!(out, "Type 'q' or 'quit' to exit.")
}

fn run(input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
    print_help(out)?;
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "q" | "quit" => break,
            "help" => print_help(out)?,
            expr => match evaluate(expr) {
                Ok(value) => writeln!(out, "= {}", format_significant(value, SIGNIFICANT_DIGITS))?,
                Err(err) => writeln!(out, "{}", err)?,
            },
        }
    }
    writeln!(out, "Bye!")
}

fn main() -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(stdin.lock(), &mut stdout.lock())
}
