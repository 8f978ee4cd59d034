//! Line-oriented assembly source.
//!
//! ```text
//! ; comment
//! start:  PUSH msg        ; immediates: 42, -7, 0x2a, 'a', '\n', or a label
//!         PUSH 6
//!         PRINT_STRING
//!         HALT
//! msg:    .string "hello\n"
//! ```
//!
//! Directives: `.org N`, `.word N|label[, ...]`, `.byte N[, ...]`, `.string "text"`.

use engine::Opcode;
use engine::word::Word;

use crate::builder::CodeBuilder;
use crate::error::AsmError;

/// Assembles `source` into a tape image.
pub fn assemble(source: &str) -> Result<Vec<u8>, AsmError> {
    let mut builder = CodeBuilder::new();
    let mut references: Vec<(String, usize)> = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let mut rest = strip_comment(raw).trim();

        while let Some((name, tail)) = split_label(rest) {
            if builder.label_address(name).is_some() {
                let message = format!("label `{}` defined more than once", name);
                return Err(AsmError::syntax(line, message));
            }
            builder.label(name);
            rest = tail.trim_start();
        }
        if rest.is_empty() {
            continue;
        }

        let (head, operand) = match rest.find(char::is_whitespace) {
            Some(split) => (&rest[..split], rest[split..].trim()),
            None => (rest, ""),
        };

        if let Some(directive) = head.strip_prefix('.') {
            directive_line(&mut builder, &mut references, line, directive, operand)?;
        } else {
            instruction_line(&mut builder, &mut references, line, head, operand)?;
        }
    }

    for (name, line) in &references {
        if builder.label_address(name).is_none() {
            return Err(AsmError::syntax(*line, format!("undefined label `{}`", name)));
        }
    }
    builder.finish()
}

fn instruction_line(
    builder: &mut CodeBuilder,
    references: &mut Vec<(String, usize)>,
    line: usize,
    mnemonic: &str,
    operand: &str,
) -> Result<(), AsmError> {
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| AsmError::syntax(line, format!("unknown mnemonic `{}`", mnemonic)))?;

    if opcode.operand_width() == 0 {
        if !operand.is_empty() {
            return Err(AsmError::syntax(line, format!("{} takes no operand", opcode)));
        }
        builder.op(opcode);
        return Ok(());
    }

    if operand.is_empty() {
        return Err(AsmError::syntax(line, format!("{} needs an operand", opcode)));
    }
    builder.op(opcode);
    emit_word_operand(builder, references, line, operand)
}

fn directive_line(
    builder: &mut CodeBuilder,
    references: &mut Vec<(String, usize)>,
    line: usize,
    directive: &str,
    operand: &str,
) -> Result<(), AsmError> {
    match directive.to_ascii_lowercase().as_str() {
        "org" => {
            let address = parse_value(operand).map_err(|msg| AsmError::syntax(line, msg))?;
            let address = usize::try_from(address)
                .map_err(|_| AsmError::syntax(line, ".org address must not be negative"))?;
            builder.seek(address);
        }
        "word" => {
            for item in list(line, operand)? {
                emit_word_operand(builder, references, line, item)?;
            }
        }
        "byte" => {
            for item in list(line, operand)? {
                let value = parse_value(item).map_err(|msg| AsmError::syntax(line, msg))?;
                let byte = u8::try_from(value)
                    .or_else(|_| i8::try_from(value).map(|b| b as u8))
                    .map_err(|_| {
                        AsmError::syntax(line, format!("{} does not fit in a byte", value))
                    })?;
                builder.byte(byte);
            }
        }
        "string" => {
            let text = parse_string(operand).map_err(|msg| AsmError::syntax(line, msg))?;
            builder.string(&text);
        }
        other => {
            return Err(AsmError::syntax(line, format!("unknown directive `.{}`", other)));
        }
    }
    Ok(())
}

fn emit_word_operand(
    builder: &mut CodeBuilder,
    references: &mut Vec<(String, usize)>,
    line: usize,
    operand: &str,
) -> Result<(), AsmError> {
    if is_identifier(operand) {
        references.push((operand.to_string(), line));
        builder.word_label(operand);
    } else {
        let value = parse_value(operand).map_err(|msg| AsmError::syntax(line, msg))?;
        builder.word(value);
    }
    Ok(())
}

fn list(line: usize, operand: &str) -> Result<Vec<&str>, AsmError> {
    let items: Vec<&str> = operand.split(',').map(str::trim).collect();
    if items.iter().any(|item| item.is_empty()) {
        return Err(AsmError::syntax(line, "expected a comma-separated list of values"));
    }
    Ok(items)
}

/// Drops a trailing `;` comment, ignoring semicolons inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ';' => return &line[..i],
            None => {}
        }
    }
    line
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    let colon = text.find(':')?;
    let name = &text[..colon];
    is_identifier(name).then(|| (name, &text[colon + 1..]))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Numeric or character-literal operand.
///
/// Hex literals may use the full 32 bits (`0xffffffff` is -1).
fn parse_value(text: &str) -> Result<Word, String> {
    let text = text.trim();
    if let Some(body) = text.strip_prefix('\'') {
        return parse_char(body).map(|c| c as u32 as Word);
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let invalid = || format!("invalid number `{}`", text);
    let (radix, digits) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // from_str_radix would take a second sign
    if digits.starts_with(['+', '-']) {
        return Err(invalid());
    }
    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| invalid())?;
    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };

    if (i128::from(Word::MIN)..=i128::from(u32::MAX)).contains(&value) {
        Ok(value as u32 as Word)
    } else {
        Err(format!("{} does not fit in a word", text))
    }
}

fn parse_char(body: &str) -> Result<char, String> {
    let inner = body
        .strip_suffix('\'')
        .ok_or_else(|| "unterminated character literal".to_string())?;
    let text = unescape(inner)?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("character literal '{}' must hold exactly one character", inner)),
    }
}

fn parse_string(text: &str) -> Result<String, String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| format!("expected a quoted string, found `{}`", text))?;
    unescape(inner)
}

fn unescape(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push(match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some(other) => return Err(format!("unknown escape `\\{}`", other)),
            None => return Err("dangling `\\` at end of literal".to_string()),
        });
    }
    Ok(out)
}
