use crate::{
    error::ErrorReport,
    lexer::{error::LexerError, tokens::Token},
    source::CodeArea,
    special_fmt,
};

#[derive(Debug, Clone)]
pub enum ParserError {
    LexingError {
        error: LexerError,
        area: CodeArea,
    },
    UnexpectedToken {
        expected: &'static str,
        found: Token,
        area: CodeArea,
    },
    InvalidLiteral {
        area: CodeArea,
    },
    InvalidAssignTarget {
        area: CodeArea,
    },
}

impl ParserError {
    pub fn area(&self) -> &CodeArea {
        match self {
            ParserError::LexingError { area, .. }
            | ParserError::UnexpectedToken { area, .. }
            | ParserError::InvalidLiteral { area }
            | ParserError::InvalidAssignTarget { area } => area,
        }
    }

    pub fn into_report(self) -> ErrorReport {
        let (typ, msg, labels) = match self {
            ParserError::LexingError { error, area } => {
                ("Lexing Error", "Invalid token", vec![(area, error.msg())])
            }
            ParserError::UnexpectedToken {
                expected,
                found,
                area,
            } => (
                "Parsing Error",
                "Unexpected token",
                vec![(
                    area,
                    special_fmt!("Expected {}, found {}", expected, found.to_str()),
                )],
            ),
            ParserError::InvalidLiteral { area } => (
                "Parsing Error",
                "Invalid literal",
                vec![(area, "This number does not fit in 64 bits".into())],
            ),
            ParserError::InvalidAssignTarget { area } => (
                "Parsing Error",
                "Invalid assignment target",
                vec![(
                    area,
                    "Only variables, fields and indices can be assigned to".into(),
                )],
            ),
        };

        ErrorReport { typ, msg, labels }
    }
}
