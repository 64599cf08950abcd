pub mod dump;
pub mod error;
pub mod resolve;
pub mod scope;
mod self_binding;

use std::{mem, rc::Rc, sync::Arc};

use ahash::AHashSet;
use lasso::{Rodeo, Spur};

use crate::{
    parser::ast::{
        Block, DeclNode, ExprNode, ExprType, FuncNode, IdentNode, Module, StmtNode, StmtType,
        StructNode,
    },
    source::{CodeArea, CodeSpan, EmberSource},
};

use self::{
    error::{ScopeError, SemanticError},
    resolve::Lookup,
    scope::{ScopeID, ScopeKind, ScopeStack, VarCounter, Variable},
};

pub type AnalyzeResult<T> = Result<T, ScopeError>;

pub const DEFAULT_BUILTINS: &[&str] = &[
    "print", "len", "type", "str", "int", "float", "range", "assert",
];

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Slots available to one function, for locals and for captures.
    pub max_locals: usize,
    /// Names that may be read without a declaration.
    pub builtins: Arc<AHashSet<String>>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_locals: u16::MAX as usize + 1,
            builtins: Arc::new(DEFAULT_BUILTINS.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopKind {
    While,
    For,
}

pub struct Analyzer<'a> {
    src: Rc<EmberSource>,
    interner: &'a mut Rodeo,
    config: &'a AnalyzerConfig,

    scopes: ScopeStack,
    var_ids: VarCounter,
    /// Loops of the function currently being analyzed.
    loops: Vec<LoopKind>,
    /// Open struct literals, innermost last.
    structs: Vec<ScopeID>,
    errors: Vec<SemanticError>,

    this_sym: Spur,
}

/// Annotates `module` in place and returns every semantic error found.
pub fn analyze(
    module: &mut Module,
    interner: &mut Rodeo,
    config: &AnalyzerConfig,
) -> AnalyzeResult<Vec<SemanticError>> {
    let mut analyzer = Analyzer::new(module.src.clone(), interner, config);
    analyzer.visit_module(module)?;
    Ok(analyzer.errors)
}

impl<'a> Analyzer<'a> {
    pub fn new(src: Rc<EmberSource>, interner: &'a mut Rodeo, config: &'a AnalyzerConfig) -> Self {
        let this_sym = interner.get_or_intern_static("this");
        Self {
            src,
            interner,
            config,
            scopes: ScopeStack::new(config.max_locals),
            var_ids: VarCounter::default(),
            loops: vec![],
            structs: vec![],
            errors: vec![],
            this_sym,
        }
    }

    pub fn resolve_name(&self, s: &Spur) -> &str {
        self.interner.resolve(s)
    }
    pub fn make_area(&self, span: CodeSpan) -> CodeArea {
        CodeArea {
            span,
            src: self.src.clone(),
        }
    }

    fn is_builtin(&self, name: Spur) -> bool {
        self.config.builtins.contains(self.resolve_name(&name))
    }

    /// Binds `name` in `scope`. `None` means the function ran out of slots.
    fn declare_in(
        &mut self,
        scope: ScopeID,
        name: Spur,
        is_const: bool,
        span: CodeSpan,
    ) -> AnalyzeResult<Option<Variable>> {
        match self.scopes.declare(scope, name, is_const, &mut self.var_ids) {
            Ok(var) => Ok(Some(var)),
            Err(ScopeError::TooManyLocals { first, .. }) => {
                if first {
                    self.too_many_locals(span);
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Binds `name` in the current scope, reporting redeclarations.
    fn declare(
        &mut self,
        name: Spur,
        span: CodeSpan,
        is_const: bool,
    ) -> AnalyzeResult<Option<Variable>> {
        let scope = self.scopes.current()?;
        if self.scopes.lookup_local(scope, name).is_some() {
            self.errors.push(SemanticError::DuplicateSymbol {
                name: self.resolve_name(&name).into(),
                area: self.make_area(span),
            });
            return Ok(None);
        }
        self.declare_in(scope, name, is_const, span)
    }

    fn declare_node(&mut self, decl: &mut DeclNode, is_const: bool) -> AnalyzeResult<()> {
        decl.var = self.declare(decl.name, decl.span, is_const)?;
        Ok(())
    }

    pub fn visit_module(&mut self, module: &mut Module) -> AnalyzeResult<()> {
        self.scopes.push(ScopeKind::function());
        self.visit_stmts(&mut module.stmts)?;
        module.info = self.scopes.pop_function()?;
        log::debug!(
            "module {}: {} locals, {} errors",
            self.src.name(),
            module.info.local_count,
            self.errors.len()
        );
        Ok(())
    }

    /// Named functions are bound before any statement runs so siblings can
    /// call each other regardless of order.
    fn visit_stmts(&mut self, stmts: &mut [StmtNode]) -> AnalyzeResult<()> {
        for stmt in stmts.iter_mut() {
            if let StmtType::Fn { name, .. } = &mut stmt.typ {
                self.declare_node(name, true)?;
            }
        }
        for stmt in stmts {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn visit_block(&mut self, block: &mut Block) -> AnalyzeResult<()> {
        self.scopes.push(ScopeKind::Block);
        self.visit_stmts(&mut block.stmts)?;
        block.scope = self.scopes.pop()?.into_scope_info();
        Ok(())
    }

    fn visit_func(&mut self, func: &mut FuncNode) -> AnalyzeResult<()> {
        let outer_loops = mem::take(&mut self.loops);

        self.scopes.push(ScopeKind::function());
        for param in &mut func.params {
            self.declare_node(param, false)?;
        }
        self.visit_stmts(&mut func.body)?;
        func.info = self.scopes.pop_function()?;

        self.loops = outer_loops;
        Ok(())
    }

    fn visit_struct(&mut self, node: &mut StructNode) -> AnalyzeResult<()> {
        let scope = self.scopes.push(ScopeKind::Struct);
        self.structs.push(scope);
        for field in &mut node.fields {
            self.visit_expr(&mut field.value)?;
        }
        self.structs.pop();
        node.scope = self.scopes.pop()?.into_scope_info();
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &mut StmtNode) -> AnalyzeResult<()> {
        let span = stmt.span;
        match &mut stmt.typ {
            StmtType::Expr(e) => self.visit_expr(e)?,
            StmtType::Let {
                is_const,
                name,
                value,
            } => {
                self.visit_expr(value)?;
                self.declare_node(name, *is_const)?;
            }
            // the name was bound by `visit_stmts`
            StmtType::Fn { func, .. } => self.visit_func(func)?,
            StmtType::Block(b) => self.visit_block(b)?,
            StmtType::If {
                cond,
                then,
                otherwise,
            } => {
                self.visit_expr(cond)?;
                self.visit_block(then)?;
                if let Some(s) = otherwise {
                    self.visit_stmt(s)?;
                }
            }
            StmtType::While { cond, body, scope } => {
                self.scopes.push(ScopeKind::Block);
                self.visit_expr(cond)?;
                self.loops.push(LoopKind::While);
                self.visit_block(body)?;
                self.loops.pop();
                *scope = self.scopes.pop()?.into_scope_info();
            }
            StmtType::For {
                names,
                iterator,
                iterable,
                body,
                scope,
            } => {
                self.scopes.push(ScopeKind::Block);
                for name in names.iter_mut() {
                    self.declare_node(name, false)?;
                }

                let depth = self.loops.iter().filter(|l| **l == LoopKind::For).count();
                let hidden = self.interner.get_or_intern(format!("$iter{}", depth));
                *iterator = self.declare(hidden, span, false)?;

                self.visit_expr(iterable)?;
                self.loops.push(LoopKind::For);
                self.visit_block(body)?;
                self.loops.pop();
                *scope = self.scopes.pop()?.into_scope_info();
            }
            StmtType::Try {
                body,
                catch,
                finally,
            } => {
                self.visit_block(body)?;
                if let Some(catch) = catch {
                    self.scopes.push(ScopeKind::Block);
                    self.declare_node(&mut catch.name, false)?;
                    self.visit_block(&mut catch.body)?;
                    catch.scope = self.scopes.pop()?.into_scope_info();
                }
                if let Some(finally) = finally {
                    self.visit_block(finally)?;
                }
            }
            StmtType::Import { names, .. } => {
                for name in names {
                    self.declare_node(name, true)?;
                }
            }
            StmtType::Break => {
                if self.loops.is_empty() {
                    self.errors.push(SemanticError::BreakOutsideLoop {
                        area: self.make_area(span),
                    })
                }
            }
            StmtType::Continue => {
                if self.loops.is_empty() {
                    self.errors.push(SemanticError::ContinueOutsideLoop {
                        area: self.make_area(span),
                    })
                }
            }
            StmtType::Return(v) => {
                if let Some(v) = v {
                    self.visit_expr(v)?;
                }
            }
            StmtType::Throw(v) => self.visit_expr(v)?,
        }
        Ok(())
    }

    fn visit_ident(&mut self, ident: &mut IdentNode, span: CodeSpan) -> AnalyzeResult<()> {
        match self.resolve(ident.name, span)? {
            Lookup::Found(var) => ident.var = Some(var),
            Lookup::Undefined if self.is_builtin(ident.name) => ident.builtin = true,
            Lookup::Undefined => self.errors.push(SemanticError::UndefinedSymbol {
                name: self.resolve_name(&ident.name).into(),
                area: self.make_area(span),
            }),
            Lookup::Failed => {}
        }
        Ok(())
    }

    /// Targets of `=`, compound assignment, `++` and `--`.
    fn visit_target(&mut self, target: &mut ExprNode) -> AnalyzeResult<()> {
        let span = target.span;
        let ExprType::Var(ident) = &mut target.typ else {
            // fields and elements only resolve their base
            return self.visit_expr(target);
        };

        self.visit_ident(ident, span)?;
        let is_const = match ident.var {
            Some(var) => var.is_const,
            None => ident.builtin,
        };
        if is_const {
            self.errors.push(SemanticError::ImmutableAssignment {
                name: self.resolve_name(&ident.name).into(),
                area: self.make_area(span),
            })
        }
        Ok(())
    }

    fn visit_expr(&mut self, expr: &mut ExprNode) -> AnalyzeResult<()> {
        let span = expr.span;
        match &mut expr.typ {
            ExprType::Int(_)
            | ExprType::Float(_)
            | ExprType::String(_)
            | ExprType::Bool(_)
            | ExprType::Null => {}

            ExprType::Var(ident) => self.visit_ident(ident, span)?,
            ExprType::This(node) => self.visit_this(node, span)?,

            ExprType::Unary(_, v) => self.visit_expr(v)?,
            ExprType::Op(a, _, b) => {
                self.visit_expr(a)?;
                self.visit_expr(b)?;
            }
            ExprType::Assign { target, value, .. } => {
                self.visit_target(target)?;
                self.visit_expr(value)?;
            }
            ExprType::Incr(target, _) => self.visit_target(target)?,

            ExprType::Index { base, index } => {
                self.visit_expr(base)?;
                self.visit_expr(index)?;
            }
            ExprType::Member { base, .. } => self.visit_expr(base)?,
            ExprType::Call { base, args } => {
                self.visit_expr(base)?;
                for arg in args {
                    self.visit_expr(arg)?;
                }
            }
            ExprType::Array(items) => {
                for item in items {
                    self.visit_expr(item)?;
                }
            }
            ExprType::Function(func) => self.visit_func(func)?,
            ExprType::Struct(node) => self.visit_struct(node)?,
        }
        Ok(())
    }
}
