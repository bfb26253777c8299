//! Literal validation and decoding.
//!
//! The tokenizer only needs [`scan_escape`] to decide whether a literal is
//! well formed; the decoders turn token text into values on demand.

use thiserror::Error;

/// ASCII control-code escape names, longest first where one is a prefix of
/// another (`SOH` must win over `SO`).
const ASCII_ESCAPES: &[(&str, u32)] = &[
    ("NUL", 0x00),
    ("SOH", 0x01),
    ("STX", 0x02),
    ("ETX", 0x03),
    ("EOT", 0x04),
    ("ENQ", 0x05),
    ("ACK", 0x06),
    ("BEL", 0x07),
    ("BS", 0x08),
    ("HT", 0x09),
    ("LF", 0x0A),
    ("VT", 0x0B),
    ("FF", 0x0C),
    ("CR", 0x0D),
    ("SO", 0x0E),
    ("SI", 0x0F),
    ("DLE", 0x10),
    ("DC1", 0x11),
    ("DC2", 0x12),
    ("DC3", 0x13),
    ("DC4", 0x14),
    ("NAK", 0x15),
    ("SYN", 0x16),
    ("ETB", 0x17),
    ("CAN", 0x18),
    ("EM", 0x19),
    ("SUB", 0x1A),
    ("ESC", 0x1B),
    ("FS", 0x1C),
    ("GS", 0x1D),
    ("RS", 0x1E),
    ("US", 0x1F),
    ("SP", 0x20),
    ("DEL", 0x7F),
];

const MAX_CODE_POINT: u32 = 0x10FFFF;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("literal is not quoted")]
    Unquoted,
    #[error("invalid escape sequence at byte {0}")]
    InvalidEscape(usize),
    #[error("character literal must contain exactly one character")]
    NotOneChar,
    #[error("malformed numeric literal")]
    MalformedNumber,
}

/// Decoded literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(u128),
    Float(f64),
    Char(char),
    String(String),
}

/// Decode one escape (the text after a backslash) into a character and the
/// number of bytes it spans. `\&` decodes to `None`.
fn decode_escape(rest: &str) -> Option<(Option<char>, usize)> {
    let first = rest.chars().next()?;
    let simple = match first {
        'a' => Some('\x07'),
        'b' => Some('\x08'),
        'f' => Some('\x0C'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0B'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        _ => None,
    };
    if let Some(c) = simple {
        return Some((Some(c), 1));
    }
    match first {
        '&' => Some((None, 1)),
        '^' => {
            let control = rest[1..].chars().next()?;
            if ('@'..='_').contains(&control) {
                let code = control as u32 - '@' as u32;
                Some((char::from_u32(code), 2))
            } else {
                None
            }
        }
        'o' => numeric_escape(&rest[1..], 8).map(|(c, n)| (Some(c), n + 1)),
        'x' => numeric_escape(&rest[1..], 16).map(|(c, n)| (Some(c), n + 1)),
        '0'..='9' => numeric_escape(rest, 10).map(|(c, n)| (Some(c), n)),
        'A'..='Z' => ASCII_ESCAPES
            .iter()
            .find(|(name, _)| rest.starts_with(name))
            .and_then(|(name, code)| char::from_u32(*code).map(|c| (Some(c), name.len()))),
        _ => None,
    }
}

fn numeric_escape(digits: &str, radix: u32) -> Option<(char, usize)> {
    let len = digits
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if len == 0 {
        return None;
    }
    let code = u32::from_str_radix(&digits[..len], radix).ok()?;
    if code > MAX_CODE_POINT {
        return None;
    }
    char::from_u32(code).map(|c| (c, len))
}

/// Length in bytes of the valid escape starting right after a backslash, or
/// `None` if the escape is malformed.
pub fn scan_escape(rest: &str) -> Option<usize> {
    decode_escape(rest).map(|(_, len)| len)
}

/// Length of a string gap (`\` whitespace `\`) starting right after the
/// opening backslash, including the closing backslash.
pub fn scan_gap(rest: &str) -> Option<usize> {
    let ws = rest
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)?;
    if ws > 0 && rest[ws..].starts_with('\\') {
        Some(ws + 1)
    } else {
        None
    }
}

/// Decode a string literal's token text, quotes included.
pub fn decode_string(text: &str) -> Result<String, LiteralError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(LiteralError::Unquoted)?;
    let mut result = String::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        let rest = &inner[i..];
        let Some(c) = rest.chars().next() else { break };
        if c != '\\' {
            result.push(c);
            i += c.len_utf8();
            continue;
        }
        let after = &rest[1..];
        if let Some(gap) = scan_gap(after) {
            i += 1 + gap;
            continue;
        }
        let (decoded, len) = decode_escape(after).ok_or(LiteralError::InvalidEscape(i + 1))?;
        if let Some(c) = decoded {
            result.push(c);
        }
        i += 1 + len;
    }
    Ok(result)
}

/// Decode a character literal's token text, quotes included.
pub fn decode_char(text: &str) -> Result<char, LiteralError> {
    let inner = text
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or(LiteralError::Unquoted)?;
    if let Some(escape) = inner.strip_prefix('\\') {
        return match decode_escape(escape) {
            Some((Some(c), len)) if len == escape.len() => Ok(c),
            _ => Err(LiteralError::InvalidEscape(2)),
        };
    }
    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(LiteralError::NotOneChar),
    }
}

/// Decode an integer literal (decimal, `0x`, `0o`, `0b`, with `_` separators).
pub fn decode_integer(text: &str) -> Result<u128, LiteralError> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let (body, radix) = match digits.get(..2) {
        Some("0x") | Some("0X") => (&digits[2..], 16),
        Some("0o") | Some("0O") => (&digits[2..], 8),
        Some("0b") | Some("0B") => (&digits[2..], 2),
        _ => (digits.as_str(), 10),
    };
    u128::from_str_radix(body, radix).map_err(|_| LiteralError::MalformedNumber)
}

pub fn decode_float(text: &str) -> Result<f64, LiteralError> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    digits.parse::<f64>().map_err(|_| LiteralError::MalformedNumber)
}
