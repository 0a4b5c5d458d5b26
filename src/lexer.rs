use core::fmt;

use log::trace;
use logos::Logos;

use crate::error::{JiffyError, LexResult};

const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, Default, PartialEq)]
enum LexFault {
    #[default]
    UnexpectedCharacter,
    MalformedNumber,
    UnterminatedText,
}

// The raw scanner classifies by first character. Numerals and words run up
// to the next delimiter, so `12ab` is one (malformed) numeral and `a.b` one word.
#[derive(Debug, Logos)]
#[logos(extras = usize)]
#[logos(error = LexFault)]
#[logos(skip r"[ \t\r\f]+")]
enum RawToken<'a> {
    #[token("\n", newline)]
    Newline,

    #[regex(r#"[0-9][^ \t\n\r{};+\-*/()="<>,?^$%]*"#, numeral)]
    Number(f64),

    #[regex(r#"\p{L}[^ \t\n\r{};+\-*/()="<>,?^$%]*"#, |lex| lex.slice())]
    Word(&'a str),

    #[token("\"", text_literal)]
    Text(&'a str),

    #[regex(r#"[^\s\p{L}0-9"]"#, |lex| lex.slice().chars().next())]
    Symbol(char),
}

fn newline<'a>(lex: &mut logos::Lexer<'a, RawToken<'a>>) -> logos::Skip {
    lex.extras += 1;
    logos::Skip
}

fn numeral<'a>(lex: &mut logos::Lexer<'a, RawToken<'a>>) -> Result<f64, LexFault> {
    lex.slice().parse().map_err(|_| LexFault::MalformedNumber)
}

fn text_literal<'a>(lex: &mut logos::Lexer<'a, RawToken<'a>>) -> Result<&'a str, LexFault> {
    let remainder = lex.remainder();
    let close = remainder.find('"').ok_or(LexFault::UnterminatedText)?;

    lex.extras += remainder[..close].matches('\n').count();
    lex.bump(close + 1);
    Ok(lex.slice())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Write,
    Read,
    While,
    If,
    Else,
    Fun,
    Return,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "write" => Self::Write,
            "read" => Self::Read,
            "while" => Self::While,
            "if" => Self::If,
            "else" => Self::Else,
            "fun" => Self::Fun,
            "return" => Self::Return,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Read => "read",
            Self::While => "while",
            Self::If => "if",
            Self::Else => "else",
            Self::Fun => "fun",
            Self::Return => "return",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Identifier(String),
    /// A text literal, delimiting quotes included.
    Text(String),
    Keyword(Keyword),
    Symbol(char),
    End,
}

impl TokenKind {
    /// Name used in syntax error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Number(_) => "NUMBER".to_owned(),
            Self::Identifier(_) => "IDENTIFIER".to_owned(),
            Self::Text(_) => "STRING".to_owned(),
            Self::Keyword(keyword) => keyword.as_str().to_uppercase(),
            Self::Symbol(symbol) => symbol.to_string(),
            Self::End => "EOLN".to_owned(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{}", number),
            Self::Identifier(name) | Self::Text(name) => write!(f, "{}", name),
            Self::Keyword(keyword) => write!(f, "{}", keyword.as_str()),
            Self::Symbol(symbol) => write!(f, "{}", symbol),
            Self::End => write!(f, "<end>"),
        }
    }
}

impl<'a> From<RawToken<'a>> for TokenKind {
    fn from(value: RawToken<'a>) -> Self {
        match value {
            RawToken::Number(number) => Self::Number(number),
            RawToken::Word(word) => match Keyword::from_word(word) {
                Some(keyword) => Self::Keyword(keyword),
                None => Self::Identifier(word.to_owned()),
            },
            RawToken::Text(text) => Self::Text(text.to_owned()),
            RawToken::Symbol(symbol) => Self::Symbol(symbol),
            RawToken::Newline => unreachable!("newlines are skipped by the scanner"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Removes everything from the comment marker to the end of each line.
pub fn strip_comments(source: &str) -> String {
    source
        .split('\n')
        .map(|line| line.find(COMMENT_MARKER).map_or(line, |index| &line[..index]))
        .collect::<Vec<_>>()
        .join("\n")
}

/// On-demand token stream over a program. `current` can be inspected any
/// number of times, `advance` moves to the next token.
pub struct Lexer {
    source: String,
    offset: usize,
    line: usize,
    current: Token,
}

impl Lexer {
    pub fn new(source: &str) -> LexResult<Self> {
        let mut lexer = Self {
            source: strip_comments(source),
            offset: 0,
            line: 1,
            current: Token { kind: TokenKind::End, line: 1 },
        };
        lexer.advance()?;
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// The line the scanner has reached.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn advance(&mut self) -> LexResult<()> {
        let mut scanner = RawToken::lexer_with_extras(&self.source[self.offset..], self.line);

        let (kind, consumed, line) = match scanner.next() {
            None => (TokenKind::End, self.source.len() - self.offset, scanner.extras),
            Some(Ok(raw)) => {
                let start_line = scanner.extras - scanner.slice().matches('\n').count();
                (TokenKind::from(raw), scanner.span().end, start_line)
            }
            Some(Err(fault)) => {
                let line = scanner.extras;
                let slice = scanner.slice();
                return Err(match fault {
                    LexFault::MalformedNumber => JiffyError::MalformedNumber { literal: slice.to_owned(), line },
                    LexFault::UnterminatedText => JiffyError::UnterminatedText { line },
                    LexFault::UnexpectedCharacter => JiffyError::UnexpectedCharacter {
                        character: slice.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER),
                        line,
                    },
                });
            }
        };
        let scanned_to = scanner.extras;

        trace!("line {}: token {:?}", line, kind);
        self.offset += consumed;
        self.line = scanned_to;
        self.current = Token { kind, line };
        Ok(())
    }
}

/// Lexes a whole program up front, end marker excluded.
pub fn tokens(source: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(source)?;
    let mut tokens = Vec::new();

    while lexer.current().kind != TokenKind::End {
        tokens.push(lexer.current().clone());
        lexer.advance()?;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::*;

    fn kinds(source: &str) -> LexResult<Vec<TokenKind>> {
        Ok(tokens(source)?.into_iter().map(|token| token.kind).collect())
    }

    #[test]
    fn classifies_by_first_character() -> anyhow::Result<()> {
        let found = kinds(r#"fun main() { x = 2.5 + "hi there"; write(x) }"#)?;

        assert_eq!(found, vec![
            TokenKind::Keyword(Keyword::Fun),
            TokenKind::Identifier("main".to_owned()),
            TokenKind::Symbol('('),
            TokenKind::Symbol(')'),
            TokenKind::Symbol('{'),
            TokenKind::Identifier("x".to_owned()),
            TokenKind::Symbol('='),
            TokenKind::Number(2.5),
            TokenKind::Symbol('+'),
            TokenKind::Text("\"hi there\"".to_owned()),
            TokenKind::Symbol(';'),
            TokenKind::Keyword(Keyword::Write),
            TokenKind::Symbol('('),
            TokenKind::Identifier("x".to_owned()),
            TokenKind::Symbol(')'),
            TokenKind::Symbol('}'),
        ]);
        Ok(())
    }

    #[test]
    fn operators_are_single_character_tokens() -> anyhow::Result<()> {
        let found = kinds("^$%<>?,==")?;
        let symbols: Vec<char> = found.into_iter()
            .map(|kind| match kind {
                TokenKind::Symbol(symbol) => symbol,
                other => panic!("unexpected {:?}", other),
            })
            .collect();

        assert_eq!(symbols, vec!['^', '$', '%', '<', '>', '?', ',', '=', '=']);
        Ok(())
    }

    #[test]
    fn comments_run_to_end_of_line() -> anyhow::Result<()> {
        let found = kinds("x # y z\n  w")?;
        assert_eq!(found, vec![
            TokenKind::Identifier("x".to_owned()),
            TokenKind::Identifier("w".to_owned()),
        ]);
        Ok(())
    }

    #[test]
    fn current_is_repeatable_until_advance() -> anyhow::Result<()> {
        let mut lexer = Lexer::new("a b")?;
        assert_eq!(lexer.current().kind, TokenKind::Identifier("a".to_owned()));
        assert_eq!(lexer.current().kind, TokenKind::Identifier("a".to_owned()));

        lexer.advance()?;
        assert_eq!(lexer.current().kind, TokenKind::Identifier("b".to_owned()));
        lexer.advance()?;
        assert_eq!(lexer.current().kind, TokenKind::End);
        lexer.advance()?;
        assert_eq!(lexer.current().kind, TokenKind::End);
        Ok(())
    }

    #[test]
    fn tracks_lines() -> anyhow::Result<()> {
        let found = tokens("a\n\n  b # note\n\"two\nlines\" c")?;
        let lines: Vec<usize> = found.iter().map(|token| token.line).collect();

        assert_eq!(lines, vec![1, 3, 4, 5]);
        Ok(())
    }

    #[test]
    fn scanner_line_runs_ahead_of_the_current_token() -> anyhow::Result<()> {
        let mut lexer = Lexer::new("a\n\n  b\n")?;
        assert_eq!((lexer.current().line, lexer.line()), (1, 1));

        lexer.advance()?;
        assert_eq!((lexer.current().line, lexer.line()), (3, 3));
        lexer.advance()?;
        assert_eq!(lexer.current().kind, TokenKind::End);
        assert_eq!(lexer.line(), 4);
        Ok(())
    }

    #[test]
    fn keywords_need_the_whole_word() -> anyhow::Result<()> {
        let found = kinds("while whiles returned")?;
        assert_eq!(found, vec![
            TokenKind::Keyword(Keyword::While),
            TokenKind::Identifier("whiles".to_owned()),
            TokenKind::Identifier("returned".to_owned()),
        ]);
        Ok(())
    }

    #[test]
    fn malformed_number_is_an_error() {
        let result = tokens("x = 12ab");
        assert_eq!(result, Err(JiffyError::MalformedNumber { literal: "12ab".to_owned(), line: 1 }));
    }

    #[test]
    fn unterminated_text_is_an_error() {
        let result = tokens("\nwrite(\"oops)");
        assert_eq!(result, Err(JiffyError::UnterminatedText { line: 2 }));
    }

    #[test]
    fn unclassifiable_character_is_an_error() {
        let result = tokens("a\n\u{a0}");
        assert_eq!(result, Err(JiffyError::UnexpectedCharacter { character: '\u{a0}', line: 2 }));

        let error = tokens("a \u{a0} b").expect_err("no-break space is not a separator");
        assert_eq!(error.kind(), ErrorKind::Lexical);
        assert_eq!(error.line(), Some(1));
    }
}
