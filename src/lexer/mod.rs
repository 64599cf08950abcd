use std::str::CharIndices;

use crate::source::CodeSpan;

use self::{error::LexerError, tokens::Token};

pub mod error;
pub mod tokens;

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<CharIndices<'a>>,
    span: CodeSpan,
}

fn is_identifier(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            span: CodeSpan::ZEROSPAN,
        }
    }
    fn next_char(&mut self) -> Option<char> {
        self.chars.next().map(|v| v.1)
    }
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|v| v.1)
    }
    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|v| v.1)
    }

    #[inline]
    pub fn span(&self) -> CodeSpan {
        self.span
    }
    #[inline]
    pub fn slice(&self) -> &'a str {
        &self.src[self.span.start..self.span.end]
    }

    fn update_span(&mut self) {
        self.span.end = if let Some(&(t, _)) = self.chars.peek() {
            t
        } else {
            self.src.len()
        };
    }

    fn skip_trivia(&mut self) {
        while let Some(&(idx, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.next_char();
                continue;
            }
            if c == '/' && self.peek_second() == Some('/') {
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.next_char();
                }
                continue;
            }
            self.span.start = idx;
            return;
        }
        self.span.start = self.src.len();
    }

    /// Consumes `=` if it is next, choosing between the two token forms.
    fn with_eq(&mut self, plain: Token, eq: Token) -> Token {
        if self.peek_char() == Some('=') {
            self.next_char();
            eq
        } else {
            plain
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexerError> {
        self.skip_trivia();

        match self.next_char() {
            Some('+') => match self.peek_char() {
                Some('+') => {
                    self.next_char();
                    Ok(Some(Token::PlusPlus))
                }
                _ => Ok(Some(self.with_eq(Token::Plus, Token::PlusEq))),
            },
            Some('-') => match self.peek_char() {
                Some('-') => {
                    self.next_char();
                    Ok(Some(Token::MinusMinus))
                }
                _ => Ok(Some(self.with_eq(Token::Minus, Token::MinusEq))),
            },
            Some('*') => match self.peek_char() {
                Some('*') => {
                    self.next_char();
                    Ok(Some(self.with_eq(Token::Pow, Token::PowEq)))
                }
                _ => Ok(Some(self.with_eq(Token::Mult, Token::MultEq))),
            },
            Some('/') => Ok(Some(self.with_eq(Token::Div, Token::DivEq))),
            Some('%') => Ok(Some(self.with_eq(Token::Mod, Token::ModEq))),

            Some('(') => Ok(Some(Token::OpenParen)),
            Some(')') => Ok(Some(Token::ClosedParen)),
            Some('[') => Ok(Some(Token::OpenSqBracket)),
            Some(']') => Ok(Some(Token::ClosedSqBracket)),
            Some('{') => Ok(Some(Token::OpenBracket)),
            Some('}') => Ok(Some(Token::ClosedBracket)),
            Some(';') => Ok(Some(Token::Semicolon)),
            Some(':') => Ok(Some(Token::Colon)),
            Some('.') => Ok(Some(Token::Period)),
            Some(',') => Ok(Some(Token::Comma)),

            Some('=') => Ok(Some(self.with_eq(Token::Assign, Token::Eq))),
            Some('!') => Ok(Some(self.with_eq(Token::Not, Token::NotEq))),
            Some('>') => Ok(Some(self.with_eq(Token::Gt, Token::Gte))),
            Some('<') => Ok(Some(self.with_eq(Token::Lt, Token::Lte))),

            Some('&') if self.peek_char() == Some('&') => {
                self.next_char();
                Ok(Some(Token::And))
            }
            Some('|') if self.peek_char() == Some('|') => {
                self.next_char();
                Ok(Some(Token::Or))
            }

            Some(t) => {
                if t.is_ascii_digit() {
                    let mut is_float = false;
                    loop {
                        if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                            self.next_char();
                            continue;
                        }
                        if !is_float
                            && self.peek_char() == Some('.')
                            && self.peek_second().is_some_and(|c| c.is_ascii_digit())
                        {
                            self.next_char();
                            is_float = true;
                            continue;
                        }
                        break;
                    }

                    return Ok(Some(if is_float { Token::Float } else { Token::Int }));
                }
                if is_identifier(t) {
                    while self.peek_char().is_some_and(is_identifier) {
                        self.next_char();
                    }
                    self.update_span();

                    return Ok(Some(match self.slice() {
                        "true" => Token::True,
                        "false" => Token::False,
                        "null" => Token::Null,
                        "if" => Token::If,
                        "else" => Token::Else,
                        "while" => Token::While,
                        "for" => Token::For,
                        "in" => Token::In,
                        "break" => Token::Break,
                        "continue" => Token::Continue,
                        "return" => Token::Return,
                        "let" => Token::Let,
                        "const" => Token::Const,
                        "fn" => Token::Fn,
                        "struct" => Token::Struct,
                        "this" => Token::This,
                        "try" => Token::Try,
                        "catch" => Token::Catch,
                        "finally" => Token::Finally,
                        "throw" => Token::Throw,
                        "import" => Token::Import,
                        "from" => Token::From,
                        _ => Token::Identifier,
                    }));
                }
                if t == '"' {
                    loop {
                        let Some(next) = self.next_char() else {
                            return Err(LexerError::UnterminatedString);
                        };
                        match next {
                            '\\' => {
                                self.next_char();
                            }
                            '"' => {
                                break;
                            }
                            _ => {}
                        }
                    }
                    return Ok(Some(Token::String));
                }
                Err(LexerError::UnknownChar(t))
            }
            None => Ok(None),
        }
    }
    pub fn next(&mut self) -> Result<Option<Token>, LexerError> {
        self.span.start = self.span.end;
        let out = self.next_token();
        self.update_span();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(code: &str) -> Vec<(Token, &str)> {
        let mut lexer = Lexer::new(code);
        let mut out = vec![];
        while let Some(tok) = lexer.next().unwrap() {
            out.push((tok, lexer.slice()));
        }
        out
    }

    #[test]
    fn postfix_and_compound_operators() {
        let toks: Vec<_> = lex_all("a++ b -= 1 c **= 2").into_iter().map(|t| t.0).collect();
        assert_eq!(
            toks,
            [
                Token::Identifier,
                Token::PlusPlus,
                Token::Identifier,
                Token::MinusEq,
                Token::Int,
                Token::Identifier,
                Token::PowEq,
                Token::Int,
            ]
        );
    }

    #[test]
    fn keywords_and_comments() {
        let toks = lex_all("const x = this; // trailing\nfor y in z {}");
        assert_eq!(toks[0], (Token::Const, "const"));
        assert_eq!(toks[3], (Token::This, "this"));
        assert_eq!(toks[5], (Token::For, "for"));
        assert_eq!(toks[6], (Token::Identifier, "y"));
        assert_eq!(toks.len(), 11);
    }

    #[test]
    fn int_followed_by_member_access_is_not_a_float() {
        let toks: Vec<_> = lex_all("1.5 2.x").into_iter().map(|t| t.0).collect();
        assert_eq!(
            toks,
            [Token::Float, Token::Int, Token::Period, Token::Identifier]
        );
    }

    #[test]
    fn unterminated_string() {
        let mut lexer = Lexer::new("\"abc");
        assert_eq!(lexer.next(), Err(LexerError::UnterminatedString));
    }
}
