//! Deterministic JSON rendering of an analyzed tree, for snapshots and tooling.
//!
//! Object keys come out sorted and variables carry their creation-order id,
//! so two runs over the same source produce identical text.

use lasso::Rodeo;
use serde::Serialize;
use serde_json::{json, Value};

use crate::parser::{
    ast::{
        Block, DeclNode, ExprNode, ExprType, FuncNode, Module, StmtNode, StmtType, StructNode,
    },
    operators::{IncrOp, UnaryOp},
};

use super::scope::{FuncInfo, ScopeInfo, Variable};

#[derive(Serialize)]
struct VarRecord<'a> {
    id: u32,
    name: &'a str,
    slot: u16,
    #[serde(rename = "const")]
    is_const: bool,
    #[serde(rename = "capture")]
    is_capture: bool,
}

struct Dumper<'a> {
    interner: &'a Rodeo,
}

pub fn dump_module(module: &Module, interner: &Rodeo) -> String {
    let dumper = Dumper { interner };
    let value = json!({
        "module": module.src.name(),
        "info": dumper.func_info(&module.info),
        "body": dumper.stmts(&module.stmts),
    });
    // a `Value` built from sorted maps always serializes
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

impl<'a> Dumper<'a> {
    fn var(&self, var: &Variable) -> Value {
        serde_json::to_value(VarRecord {
            id: *var.id,
            name: self.interner.resolve(&var.symbol),
            slot: var.slot,
            is_const: var.is_const,
            is_capture: var.is_capture,
        })
        .unwrap_or(Value::Null)
    }
    fn opt_var(&self, var: &Option<Variable>) -> Value {
        var.as_ref().map_or(Value::Null, |v| self.var(v))
    }
    fn vars(&self, vars: &[Variable]) -> Value {
        vars.iter().map(|v| self.var(v)).collect()
    }

    fn scope_info(&self, info: &ScopeInfo) -> Value {
        self.vars(&info.vars)
    }
    fn func_info(&self, info: &FuncInfo) -> Value {
        json!({
            "vars": self.vars(&info.vars),
            "local_count": info.local_count,
            "captures": self.vars(&info.captures),
            "parent_captures": self.vars(&info.parent_captures),
        })
    }

    fn decl(&self, decl: &DeclNode) -> Value {
        json!({
            "name": self.interner.resolve(&decl.name),
            "var": self.opt_var(&decl.var),
        })
    }
    fn decls(&self, decls: &[DeclNode]) -> Value {
        decls.iter().map(|d| self.decl(d)).collect()
    }

    fn func(&self, func: &FuncNode) -> Value {
        json!({
            "params": self.decls(&func.params),
            "info": self.func_info(&func.info),
            "body": self.stmts(&func.body),
        })
    }
    fn structure(&self, node: &StructNode) -> Value {
        let fields: Vec<Value> = node
            .fields
            .iter()
            .map(|f| {
                json!({
                    "name": self.interner.resolve(&f.name),
                    "value": self.expr(&f.value),
                })
            })
            .collect();
        json!({
            "kind": "struct",
            "fields": fields,
            "scope": self.scope_info(&node.scope),
        })
    }

    fn block(&self, block: &Block) -> Value {
        json!({
            "scope": self.scope_info(&block.scope),
            "body": self.stmts(&block.stmts),
        })
    }
    fn opt_block(&self, block: &Option<Block>) -> Value {
        block.as_ref().map_or(Value::Null, |b| self.block(b))
    }

    fn stmts(&self, stmts: &[StmtNode]) -> Value {
        stmts.iter().map(|s| self.stmt(s)).collect()
    }
    fn exprs(&self, exprs: &[ExprNode]) -> Value {
        exprs.iter().map(|e| self.expr(e)).collect()
    }

    fn stmt(&self, stmt: &StmtNode) -> Value {
        match &stmt.typ {
            StmtType::Expr(e) => json!({ "kind": "expr", "expr": self.expr(e) }),
            StmtType::Let {
                is_const,
                name,
                value,
            } => json!({
                "kind": if *is_const { "const" } else { "let" },
                "name": self.decl(name),
                "value": self.expr(value),
            }),
            StmtType::Fn { name, func } => json!({
                "kind": "fn",
                "name": self.decl(name),
                "func": self.func(func),
            }),
            StmtType::Block(b) => json!({ "kind": "block", "block": self.block(b) }),
            StmtType::If {
                cond,
                then,
                otherwise,
            } => json!({
                "kind": "if",
                "cond": self.expr(cond),
                "then": self.block(then),
                "else": otherwise.as_ref().map_or(Value::Null, |s| self.stmt(s)),
            }),
            StmtType::While { cond, body, scope } => json!({
                "kind": "while",
                "cond": self.expr(cond),
                "body": self.block(body),
                "scope": self.scope_info(scope),
            }),
            StmtType::For {
                names,
                iterator,
                iterable,
                body,
                scope,
            } => json!({
                "kind": "for",
                "names": self.decls(names),
                "iterator": self.opt_var(iterator),
                "iterable": self.expr(iterable),
                "body": self.block(body),
                "scope": self.scope_info(scope),
            }),
            StmtType::Try {
                body,
                catch,
                finally,
            } => json!({
                "kind": "try",
                "body": self.block(body),
                "catch": catch.as_ref().map_or(Value::Null, |c| json!({
                    "name": self.decl(&c.name),
                    "body": self.block(&c.body),
                    "scope": self.scope_info(&c.scope),
                })),
                "finally": self.opt_block(finally),
            }),
            StmtType::Import { names, path } => json!({
                "kind": "import",
                "names": self.decls(names),
                "path": self.interner.resolve(path),
            }),
            StmtType::Break => json!({ "kind": "break" }),
            StmtType::Continue => json!({ "kind": "continue" }),
            StmtType::Return(v) => json!({
                "kind": "return",
                "value": v.as_ref().map_or(Value::Null, |v| self.expr(v)),
            }),
            StmtType::Throw(v) => json!({ "kind": "throw", "value": self.expr(v) }),
        }
    }

    fn expr(&self, expr: &ExprNode) -> Value {
        match &expr.typ {
            ExprType::Int(v) => json!(v),
            ExprType::Float(v) => json!(v),
            ExprType::String(s) => json!({ "kind": "string", "value": self.interner.resolve(s) }),
            ExprType::Bool(b) => json!(b),
            ExprType::Null => Value::Null,

            ExprType::Var(ident) => json!({
                "kind": "ident",
                "name": self.interner.resolve(&ident.name),
                "var": self.opt_var(&ident.var),
                "builtin": ident.builtin,
            }),
            ExprType::This(node) => json!({ "kind": "this", "var": self.opt_var(&node.var) }),

            ExprType::Unary(op, v) => json!({
                "kind": "unary",
                "op": match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Minus => "-",
                },
                "value": self.expr(v),
            }),
            ExprType::Op(a, op, b) => json!({
                "kind": "binary",
                "op": op.to_str(),
                "left": self.expr(a),
                "right": self.expr(b),
            }),
            ExprType::Assign { target, op, value } => json!({
                "kind": "assign",
                "op": op.map_or("=", |op| op.to_str()),
                "target": self.expr(target),
                "value": self.expr(value),
            }),
            ExprType::Incr(target, op) => json!({
                "kind": match op {
                    IncrOp::Incr => "incr",
                    IncrOp::Decr => "decr",
                },
                "target": self.expr(target),
            }),
            ExprType::Index { base, index } => json!({
                "kind": "index",
                "base": self.expr(base),
                "index": self.expr(index),
            }),
            ExprType::Member { base, member } => json!({
                "kind": "member",
                "base": self.expr(base),
                "member": self.interner.resolve(member),
            }),
            ExprType::Call { base, args } => json!({
                "kind": "call",
                "base": self.expr(base),
                "args": self.exprs(args),
            }),
            ExprType::Array(items) => json!({ "kind": "array", "items": self.exprs(items) }),
            ExprType::Function(func) => {
                let mut value = self.func(func);
                value["kind"] = json!("fn");
                value
            }
            ExprType::Struct(node) => self.structure(node),
        }
    }
}
