use std::rc::Rc;

use lasso::Spur;

use crate::{
    analyzer::scope::{FuncInfo, ScopeInfo, Variable},
    source::{CodeSpan, EmberSource},
};

use super::operators::{BinOp, IncrOp, UnaryOp};

/// A name being read or written. Filled in by the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentNode {
    pub name: Spur,
    pub var: Option<Variable>,
    pub builtin: bool,
}

impl IdentNode {
    pub fn new(name: Spur) -> Self {
        Self {
            name,
            var: None,
            builtin: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThisNode {
    pub var: Option<Variable>,
}

/// A name being bound (let, parameter, loop variable, catch, import).
#[derive(Debug, Clone, PartialEq)]
pub struct DeclNode {
    pub name: Spur,
    pub span: CodeSpan,
    pub var: Option<Variable>,
}

impl DeclNode {
    pub fn new(name: Spur, span: CodeSpan) -> Self {
        Self {
            name,
            span,
            var: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncNode {
    pub params: Vec<DeclNode>,
    pub body: Vec<StmtNode>,
    pub info: FuncInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: Spur,
    pub span: CodeSpan,
    pub value: ExprNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructNode {
    pub fields: Vec<StructField>,
    pub scope: ScopeInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub typ: ExprType,
    pub span: CodeSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprType {
    Int(i64),
    Float(f64),
    String(Spur),
    Bool(bool),
    Null,

    Var(IdentNode),
    This(ThisNode),

    Unary(UnaryOp, Box<ExprNode>),
    Op(Box<ExprNode>, BinOp, Box<ExprNode>),

    /// `op` is `None` for plain `=`.
    Assign {
        target: Box<ExprNode>,
        op: Option<BinOp>,
        value: Box<ExprNode>,
    },
    Incr(Box<ExprNode>, IncrOp),

    Index {
        base: Box<ExprNode>,
        index: Box<ExprNode>,
    },
    Member {
        base: Box<ExprNode>,
        member: Spur,
    },
    Call {
        base: Box<ExprNode>,
        args: Vec<ExprNode>,
    },

    Array(Vec<ExprNode>),
    Function(FuncNode),
    Struct(StructNode),
}

impl ExprType {
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            ExprType::Var(_) | ExprType::Member { .. } | ExprType::Index { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<StmtNode>,
    pub scope: ScopeInfo,
    pub span: CodeSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub name: DeclNode,
    pub body: Block,
    pub scope: ScopeInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StmtNode {
    pub typ: StmtType,
    pub span: CodeSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtType {
    Expr(ExprNode),
    Let {
        is_const: bool,
        name: DeclNode,
        value: ExprNode,
    },
    Fn {
        name: DeclNode,
        func: FuncNode,
    },
    Block(Block),

    If {
        cond: ExprNode,
        then: Block,
        otherwise: Option<Box<StmtNode>>,
    },
    While {
        cond: ExprNode,
        body: Block,
        /// Wraps the condition and the body.
        scope: ScopeInfo,
    },
    For {
        names: Vec<DeclNode>,
        iterator: Option<Variable>,
        iterable: ExprNode,
        body: Block,
        scope: ScopeInfo,
    },
    Try {
        body: Block,
        catch: Option<CatchClause>,
        finally: Option<Block>,
    },

    Import {
        names: Vec<DeclNode>,
        path: Spur,
    },

    Break,
    Continue,
    Return(Option<ExprNode>),
    Throw(ExprNode),
}

/// A parsed source file. The module body is analyzed as a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub stmts: Vec<StmtNode>,
    pub info: FuncInfo,
    pub src: Rc<EmberSource>,
}
