// Shared word-splitting primitives for recipe lines and search queries
use crate::error::{LoadError, LoadResult};
use std::iter::Peekable;
use std::str::Chars;

/// Split a line into words the way a POSIX shell would.
///
/// Whitespace separates words. Single quotes keep their content verbatim,
/// double quotes allow `\"`, `\\`, `\$` and `` \` `` escapes, and a backslash
/// outside of quotes escapes any character. An empty quoted string still
/// produces a word.
pub fn split_words(line: &str) -> LoadResult<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(unclosed_quote(line)),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some('\n') => {}
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(unclosed_quote(line)),
                        },
                        Some(c) => current.push(c),
                        None => return Err(unclosed_quote(line)),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some('\n') => {}
                    Some(c) => current.push(c),
                    None => {
                        return Err(LoadError::new(format!(
                            "No escaped character after trailing backslash in '{}'",
                            line.trim_end()
                        )))
                    }
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}

fn unclosed_quote(line: &str) -> LoadError {
    LoadError::new(format!("No closing quotation in '{}'", line.trim_end()))
}

/// Character cursor with one character of lookahead
pub struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    pub fn next_char(&mut self) -> Option<char> {
        self.chars.next()
    }

    pub fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consume characters while they are in `skip`
    pub fn skip_while_in(&mut self, skip: &[char]) {
        while self.chars.next_if(|c| skip.contains(c)).is_some() {}
    }

    /// Read until one of `end` is seen (left unconsumed) or input runs out.
    ///
    /// A backslash takes the following character literally, including any of
    /// the end characters.
    pub fn scan_until(&mut self, end: &[char]) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.chars.next();
                match self.chars.next() {
                    Some(escaped) => out.push(escaped),
                    None => break,
                }
            } else if end.contains(&c) {
                break;
            } else {
                out.push(c);
                self.chars.next();
            }
        }
        out
    }
}
