use super::SplitMode;

/// Result of looking for the next unit at the front of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// A unit made of the first `len` bytes; consume `advance` bytes
    Token { advance: usize, len: usize },
    /// Bytes that do not form a valid character; emit U+FFFD and consume `advance`
    Invalid { advance: usize },
    /// Consume bytes without producing a unit
    Skip(usize),
    /// No complete unit yet; at end of stream this means nothing is left
    NeedMore,
}

/// Find the next unit at the start of `data`
///
/// `at_eof` tells the splitter no more bytes will follow, so a trailing
/// partial unit must be emitted (or reported as invalid) rather than waited on.
pub fn split(mode: SplitMode, data: &[u8], at_eof: bool) -> Split {
    match mode {
        SplitMode::Bytes => split_bytes(data),
        SplitMode::Runes => split_runes(data, at_eof),
        SplitMode::Words => split_words(data, at_eof),
        SplitMode::Lines => split_lines(data, at_eof),
    }
}

fn split_bytes(data: &[u8]) -> Split {
    if data.is_empty() {
        return Split::NeedMore;
    }
    Split::Token { advance: 1, len: 1 }
}

fn split_runes(data: &[u8], at_eof: bool) -> Split {
    match decode_char(data) {
        Decoded::Char(c) => {
            let width = c.len_utf8();
            Split::Token {
                advance: width,
                len: width,
            }
        }
        Decoded::Empty => Split::NeedMore,
        Decoded::Incomplete if !at_eof => Split::NeedMore,
        Decoded::Incomplete | Decoded::Invalid => Split::Invalid { advance: 1 },
    }
}

fn split_words(data: &[u8], at_eof: bool) -> Split {
    // Leading whitespace is consumed on its own so the token always starts at 0
    let mut start = 0;
    while start < data.len() {
        match decode_char(&data[start..]) {
            Decoded::Char(c) if c.is_whitespace() => start += c.len_utf8(),
            _ => break,
        }
    }
    if start > 0 {
        return Split::Skip(start);
    }

    let mut end = 0;
    while end < data.len() {
        match decode_char(&data[end..]) {
            Decoded::Char(c) if c.is_whitespace() => {
                return Split::Token {
                    advance: end + c.len_utf8(),
                    len: end,
                };
            }
            Decoded::Char(c) => end += c.len_utf8(),
            Decoded::Incomplete if !at_eof => return Split::NeedMore,
            Decoded::Incomplete | Decoded::Invalid | Decoded::Empty => end += 1,
        }
    }

    if at_eof && !data.is_empty() {
        return Split::Token {
            advance: data.len(),
            len: data.len(),
        };
    }

    Split::NeedMore
}

fn split_lines(data: &[u8], at_eof: bool) -> Split {
    if data.is_empty() {
        return Split::NeedMore;
    }

    if let Some(newline) = data.iter().position(|&b| b == b'\n') {
        return Split::Token {
            advance: newline + 1,
            len: trim_carriage_return(&data[..newline]),
        };
    }

    if at_eof {
        return Split::Token {
            advance: data.len(),
            len: trim_carriage_return(data),
        };
    }

    Split::NeedMore
}

/// Length of `line` once a single trailing `\r` is dropped
fn trim_carriage_return(line: &[u8]) -> usize {
    match line.last() {
        Some(b'\r') => line.len() - 1,
        _ => line.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoded {
    Char(char),
    /// Valid prefix of a multi-byte sequence that needs more bytes
    Incomplete,
    Invalid,
    Empty,
}

/// Decode the first UTF-8 character of `data`
fn decode_char(data: &[u8]) -> Decoded {
    if data.is_empty() {
        return Decoded::Empty;
    }
    if data[0] < 0x80 {
        return Decoded::Char(data[0] as char);
    }

    let window = &data[..data.len().min(4)];
    let valid = match std::str::from_utf8(window) {
        Ok(text) => text,
        Err(e) if e.valid_up_to() > 0 => match std::str::from_utf8(&window[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return Decoded::Invalid,
        },
        Err(e) => {
            return match e.error_len() {
                None => Decoded::Incomplete,
                Some(_) => Decoded::Invalid,
            };
        }
    };

    match valid.chars().next() {
        Some(c) => Decoded::Char(c),
        None => Decoded::Invalid,
    }
}
