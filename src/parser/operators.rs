use crate::lexer::tokens::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Plus,
    Minus,
    Mult,
    Div,
    Mod,
    Pow,

    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,

    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrOp {
    Incr,
    Decr,
}

impl BinOp {
    pub fn to_str(self) -> &'static str {
        match self {
            BinOp::Plus => "+",
            BinOp::Minus => "-",
            BinOp::Mult => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Gt => ">",
            BinOp::Gte => ">=",
            BinOp::Lt => "<",
            BinOp::Lte => "<=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

impl Token {
    pub fn to_bin_op(self) -> Option<BinOp> {
        Some(match self {
            Token::Plus => BinOp::Plus,
            Token::Minus => BinOp::Minus,
            Token::Mult => BinOp::Mult,
            Token::Div => BinOp::Div,
            Token::Mod => BinOp::Mod,
            Token::Pow => BinOp::Pow,
            Token::Eq => BinOp::Eq,
            Token::NotEq => BinOp::NotEq,
            Token::Gt => BinOp::Gt,
            Token::Gte => BinOp::Gte,
            Token::Lt => BinOp::Lt,
            Token::Lte => BinOp::Lte,
            Token::And => BinOp::And,
            Token::Or => BinOp::Or,
            _ => return None,
        })
    }
    pub fn to_unary_op(self) -> Option<UnaryOp> {
        Some(match self {
            Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Minus,
            _ => return None,
        })
    }
    /// The operator a compound assignment applies; `None` for plain `=`.
    pub fn to_assign_op(self) -> Option<BinOp> {
        Some(match self {
            Token::PlusEq => BinOp::Plus,
            Token::MinusEq => BinOp::Minus,
            Token::MultEq => BinOp::Mult,
            Token::DivEq => BinOp::Div,
            Token::ModEq => BinOp::Mod,
            Token::PowEq => BinOp::Pow,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Left,
    Right,
    Unary,
}

const PRECEDENCES: &[(OpType, &[Token])] = &[
    (OpType::Left, &[Token::Or]),
    (OpType::Left, &[Token::And]),
    (OpType::Left, &[Token::Eq, Token::NotEq]),
    (
        OpType::Left,
        &[Token::Gt, Token::Gte, Token::Lt, Token::Lte],
    ),
    (OpType::Left, &[Token::Plus, Token::Minus]),
    (OpType::Left, &[Token::Mult, Token::Div, Token::Mod]),
    (OpType::Unary, &[Token::Minus, Token::Not]),
    (OpType::Right, &[Token::Pow]),
];

pub fn prec_type(prec: usize) -> OpType {
    PRECEDENCES[prec].0
}

/// The next binary precedence level above `prec`, skipping unary levels.
pub fn next_infix(prec: usize) -> Option<usize> {
    (prec + 1..PRECEDENCES.len()).find(|p| PRECEDENCES[*p].0 != OpType::Unary)
}

pub fn is_infix_prec(tok: Token, prec: usize) -> bool {
    let (typ, toks) = PRECEDENCES[prec];
    typ != OpType::Unary && toks.contains(&tok)
}

pub fn unary_prec(tok: Token) -> Option<usize> {
    PRECEDENCES
        .iter()
        .position(|(typ, toks)| *typ == OpType::Unary && toks.contains(&tok))
}
