use crate::{error::ErrorReport, source::CodeArea, special_fmt};

use super::scope::ScopeID;

/// A semantic diagnostic. These are collected, never thrown: one analysis
/// run reports every error it can find.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("symbol `{name}` is already defined in this scope, at {area}")]
    DuplicateSymbol { name: String, area: CodeArea },
    #[error("symbol `{name}` is not defined, at {area}")]
    UndefinedSymbol { name: String, area: CodeArea },
    #[error("cannot assign to constant `{name}`, at {area}")]
    ImmutableAssignment { name: String, area: CodeArea },
    #[error("`break` outside of a loop, at {area}")]
    BreakOutsideLoop { area: CodeArea },
    #[error("`continue` outside of a loop, at {area}")]
    ContinueOutsideLoop { area: CodeArea },
    #[error("`this` outside of a struct, at {area}")]
    ThisOutsideStruct { area: CodeArea },
    #[error("function needs more than {limit} slots, at {area}")]
    TooManyLocals { limit: usize, area: CodeArea },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DuplicateSymbol,
    UndefinedSymbol,
    ImmutableAssignment,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    ThisOutsideStruct,
    TooManyLocals,
}

impl SemanticError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SemanticError::DuplicateSymbol { .. } => ErrorKind::DuplicateSymbol,
            SemanticError::UndefinedSymbol { .. } => ErrorKind::UndefinedSymbol,
            SemanticError::ImmutableAssignment { .. } => ErrorKind::ImmutableAssignment,
            SemanticError::BreakOutsideLoop { .. } => ErrorKind::BreakOutsideLoop,
            SemanticError::ContinueOutsideLoop { .. } => ErrorKind::ContinueOutsideLoop,
            SemanticError::ThisOutsideStruct { .. } => ErrorKind::ThisOutsideStruct,
            SemanticError::TooManyLocals { .. } => ErrorKind::TooManyLocals,
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            SemanticError::DuplicateSymbol { name, .. }
            | SemanticError::UndefinedSymbol { name, .. }
            | SemanticError::ImmutableAssignment { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn area(&self) -> &CodeArea {
        match self {
            SemanticError::DuplicateSymbol { area, .. }
            | SemanticError::UndefinedSymbol { area, .. }
            | SemanticError::ImmutableAssignment { area, .. }
            | SemanticError::BreakOutsideLoop { area }
            | SemanticError::ContinueOutsideLoop { area }
            | SemanticError::ThisOutsideStruct { area }
            | SemanticError::TooManyLocals { area, .. } => area,
        }
    }

    pub fn into_report(self) -> ErrorReport {
        let (msg, labels) = match self {
            SemanticError::DuplicateSymbol { name, area } => (
                "Duplicate symbol",
                vec![(area, special_fmt!("{} is already defined in this scope", name))],
            ),
            SemanticError::UndefinedSymbol { name, area } => (
                "Undefined symbol",
                vec![(area, special_fmt!("{} is not defined", name))],
            ),
            SemanticError::ImmutableAssignment { name, area } => (
                "Assignment to constant",
                vec![(area, special_fmt!("{} is a constant", name))],
            ),
            SemanticError::BreakOutsideLoop { area } => (
                "Break outside of loop",
                vec![(area, special_fmt!("{} can only be used inside a loop", "break"))],
            ),
            SemanticError::ContinueOutsideLoop { area } => (
                "Continue outside of loop",
                vec![(
                    area,
                    special_fmt!("{} can only be used inside a loop", "continue"),
                )],
            ),
            SemanticError::ThisOutsideStruct { area } => (
                "This outside of struct",
                vec![(
                    area,
                    special_fmt!("{} can only be used inside a struct", "this"),
                )],
            ),
            SemanticError::TooManyLocals { limit, area } => (
                "Too many locals",
                vec![(
                    area,
                    special_fmt!("This function needs more than {} slots", limit),
                )],
            ),
        };

        ErrorReport {
            typ: "Semantic Error",
            msg,
            labels,
        }
    }
}

/// Broken internal invariants of the scope machinery. These are bugs in the
/// caller, not in the analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("symbol already defined in scope {0:?}")]
    AlreadyDefined(ScopeID),
    #[error("struct scope {0:?} already holds its self binding")]
    StructScopeOccupied(ScopeID),
    #[error("scope {0:?} has no enclosing function scope")]
    NoEnclosingFunction(ScopeID),
    #[error("scope {0:?} is not a function scope")]
    NotAFunction(ScopeID),
    #[error("scope {0:?} is not open")]
    NotOpen(ScopeID),
    #[error("the scope stack is empty")]
    EmptyStack,
    #[error("function scope {scope:?} ran out of slots")]
    TooManyLocals { scope: ScopeID, first: bool },
    #[error("self binding of struct scope {0:?} could not be resolved")]
    SelfBindingLost(ScopeID),
}
