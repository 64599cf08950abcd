macro_rules! tokens {
    (
        $(
            $tok:ident: $name:literal,
        )*
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Token {
            $($tok,)*
        }

        impl Token {
            pub fn to_str(self) -> &'static str {
                match self {
                    $(
                        Self::$tok => $name,
                    )*
                }
            }
        }
    };
}

tokens! {
    Int: "int literal",
    Float: "float literal",
    String: "string literal",

    True: "true",
    False: "false",
    Null: "null",

    Identifier: "identifier",

    Plus: "+",
    Minus: "-",
    Mult: "*",
    Div: "/",
    Mod: "%",
    Pow: "**",
    PlusEq: "+=",
    MinusEq: "-=",
    MultEq: "*=",
    DivEq: "/=",
    ModEq: "%=",
    PowEq: "**=",

    PlusPlus: "++",
    MinusMinus: "--",

    Assign: "=",

    Eq: "==",
    NotEq: "!=",
    Gt: ">",
    Gte: ">=",
    Lt: "<",
    Lte: "<=",

    And: "&&",
    Or: "||",
    Not: "!",

    OpenParen: "(",
    ClosedParen: ")",
    OpenSqBracket: "[",
    ClosedSqBracket: "]",
    OpenBracket: "{",
    ClosedBracket: "}",

    If: "if",
    Else: "else",
    While: "while",
    For: "for",
    In: "in",
    Break: "break",
    Continue: "continue",
    Return: "return",

    Let: "let",
    Const: "const",
    Fn: "fn",
    Struct: "struct",
    This: "this",

    Try: "try",
    Catch: "catch",
    Finally: "finally",
    Throw: "throw",

    Import: "import",
    From: "from",

    Semicolon: ";",
    Colon: ":",
    Period: ".",
    Comma: ",",

    Eof: "end of file",
}

impl Token {
    /// `=` or any of the compound assignment operators.
    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            Token::Assign
                | Token::PlusEq
                | Token::MinusEq
                | Token::MultEq
                | Token::DivEq
                | Token::ModEq
                | Token::PowEq
        )
    }
}
