// Console
// The only door between a running machine and the outside world.
// PRINT_* instructions write through it, READ_* instructions block on it.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use thiserror::Error;

pub trait Console {
    fn write_text(&mut self, text: &str) -> Result<(), ConsoleError>;
    fn write_number(&mut self, value: i32) -> Result<(), ConsoleError>;
    fn read_number(&mut self) -> Result<i32, ConsoleError>;
    fn read_text(&mut self) -> Result<String, ConsoleError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Input arrived but could not be interpreted.
    #[error("malformed input {input:?}: expected {expected}")]
    Format { input: String, expected: &'static str },
    /// The input source is exhausted.
    #[error("input closed")]
    Closed,
    #[error("io: {0}")]
    Io(String),
}

impl From<io::Error> for ConsoleError {
    fn from(err: io::Error) -> Self {
        ConsoleError::Io(err.to_string())
    }
}

/// Parses one line of input as a signed 32-bit number.
pub fn parse_number(line: &str) -> Result<i32, ConsoleError> {
    line.trim().parse::<i32>().map_err(|_| ConsoleError::Format {
        input: line.to_string(),
        expected: "a signed 32-bit integer",
    })
}

fn strip_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

// --- BLOCKING STDIO ---

/// Console bound to the process stdin/stdout.
///
/// Each read consumes one line. Numbers are printed on their own line, text
/// is printed verbatim.
pub struct StdConsole<R = io::StdinLock<'static>, W = io::Stdout> {
    input: R,
    output: W,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> StdConsole<R, W> {
    pub fn with_streams(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Result<String, ConsoleError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConsoleError::Closed);
        }
        Ok(strip_newline(line))
    }
}

impl<R: BufRead, W: Write> Console for StdConsole<R, W> {
    fn write_text(&mut self, text: &str) -> Result<(), ConsoleError> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    fn write_number(&mut self, value: i32) -> Result<(), ConsoleError> {
        writeln!(self.output, "{}", value)?;
        self.output.flush()?;
        Ok(())
    }

    fn read_number(&mut self) -> Result<i32, ConsoleError> {
        let line = self.read_line()?;
        parse_number(&line)
    }

    fn read_text(&mut self) -> Result<String, ConsoleError> {
        self.read_line()
    }
}

// --- SCRIPTED (tests, wasm) ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Number(i32),
}

/// In-memory console fed from a fixed list of input lines.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    input: VecDeque<String>,
    events: Vec<Output>,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[Output] {
        &self.events
    }

    /// Everything written so far, numbers rendered in decimal without separators.
    pub fn output(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            match event {
                Output::Text(text) => out.push_str(text),
                Output::Number(n) => out.push_str(&n.to_string()),
            }
        }
        out
    }

    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Console for ScriptedConsole {
    fn write_text(&mut self, text: &str) -> Result<(), ConsoleError> {
        self.events.push(Output::Text(text.to_string()));
        Ok(())
    }

    fn write_number(&mut self, value: i32) -> Result<(), ConsoleError> {
        self.events.push(Output::Number(value));
        Ok(())
    }

    fn read_number(&mut self) -> Result<i32, ConsoleError> {
        let line = self.input.pop_front().ok_or(ConsoleError::Closed)?;
        parse_number(&line)
    }

    fn read_text(&mut self) -> Result<String, ConsoleError> {
        self.input.pop_front().ok_or(ConsoleError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_accepts_signed_and_padded() {
        assert_eq!(parse_number(" -42 ").unwrap(), -42);
        assert_eq!(parse_number("2147483647").unwrap(), i32::MAX);
    }

    #[test]
    fn parse_number_rejects_garbage_and_overflow() {
        assert!(matches!(parse_number("abc"), Err(ConsoleError::Format { .. })));
        assert!(matches!(parse_number("2147483648"), Err(ConsoleError::Format { .. })));
        assert!(matches!(parse_number(""), Err(ConsoleError::Format { .. })));
    }

    #[test]
    fn scripted_console_records_events_in_order() {
        let mut console = ScriptedConsole::new();
        console.write_text("n=").unwrap();
        console.write_number(7).unwrap();
        assert_eq!(
            console.events(),
            &[Output::Text("n=".into()), Output::Number(7)]
        );
        assert_eq!(console.output(), "n=7");
    }

    #[test]
    fn scripted_console_runs_dry() {
        let mut console = ScriptedConsole::with_input(["12", "hello"]);
        assert_eq!(console.read_number().unwrap(), 12);
        assert_eq!(console.read_text().unwrap(), "hello");
        assert_eq!(console.read_text(), Err(ConsoleError::Closed));
    }

    #[test]
    fn std_console_reads_lines_and_prints_numbers() {
        let input = io::Cursor::new(b"5\r\nworld\n".to_vec());
        let mut console = StdConsole::with_streams(input, Vec::new());
        assert_eq!(console.read_number().unwrap(), 5);
        assert_eq!(console.read_text().unwrap(), "world");
        assert_eq!(console.read_text(), Err(ConsoleError::Closed));
        console.write_text("x=").unwrap();
        console.write_number(-3).unwrap();
        assert_eq!(console.into_output(), b"x=-3\n");
    }
}
