use ahash::RandomState;
use indexmap::IndexMap;
use lasso::Spur;
use slab::Slab;

use crate::make_ids;

use super::error::ScopeError;

make_ids! {
    ScopeID: u32;
    /// Creation-order identity of a [`Variable`], reset for every analysis run.
    VarID: u32;
}

pub type OrderedMap<K, V> = IndexMap<K, V, RandomState>;

/// A resolved binding.
///
/// `slot` indexes the owning function's locals when `is_capture` is false, and
/// its capture table otherwise. Two references to the same binding compare
/// equal; every capturing function gets its own distinct link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable {
    pub id: VarID,
    pub symbol: Spur,
    pub slot: u16,
    pub is_const: bool,
    pub is_capture: bool,
}

/// Hands out [`VarID`]s in creation order.
#[derive(Debug, Default)]
pub struct VarCounter {
    next: u32,
}

impl VarCounter {
    pub fn next_id(&mut self) -> VarID {
        let id = VarID(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Default)]
pub struct FunctionScope {
    next_slot: usize,
    exhausted: bool,
    /// name -> (captured from, local capture cell)
    pub captures: OrderedMap<Spur, (Variable, Variable)>,
}

impl FunctionScope {
    pub fn local_count(&self) -> usize {
        self.next_slot
    }
}

#[derive(Debug)]
pub enum ScopeKind {
    Block,
    Function(FunctionScope),
    Struct,
}

impl ScopeKind {
    pub fn function() -> Self {
        ScopeKind::Function(FunctionScope::default())
    }
}

#[derive(Debug)]
pub struct Scope {
    pub vars: OrderedMap<Spur, Variable>,
    pub kind: ScopeKind,
}

/// Bindings declared directly in a block, loop, catch or struct scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeInfo {
    pub vars: Vec<Variable>,
}

/// What the code generator needs to know about a function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuncInfo {
    pub vars: Vec<Variable>,
    pub local_count: usize,
    /// Capture cells in slot order.
    pub captures: Vec<Variable>,
    /// `parent_captures[i]` is the outer binding snapshotted into capture slot `i`.
    pub parent_captures: Vec<Variable>,
}

impl FuncInfo {
    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }
}

impl Scope {
    pub fn into_scope_info(self) -> ScopeInfo {
        ScopeInfo {
            vars: self.vars.into_values().collect(),
        }
    }
}

/// All scopes of one analysis run, plus the stack of currently open ones.
#[derive(Debug)]
pub struct ScopeStack {
    arena: Slab<Scope>,
    stack: Vec<ScopeID>,
    max_locals: usize,
}

impl ScopeStack {
    pub fn new(max_locals: usize) -> Self {
        Self {
            arena: Slab::new(),
            stack: vec![],
            max_locals: max_locals.min(u16::MAX as usize + 1),
        }
    }

    pub fn max_locals(&self) -> usize {
        self.max_locals
    }

    pub fn push(&mut self, kind: ScopeKind) -> ScopeID {
        let id = ScopeID::from(self.arena.insert(Scope {
            vars: OrderedMap::default(),
            kind,
        }));
        self.stack.push(id);
        log::trace!("push scope {:?} (depth {})", id, self.stack.len());
        id
    }

    pub fn pop(&mut self) -> Result<Scope, ScopeError> {
        let id = self.stack.pop().ok_or(ScopeError::EmptyStack)?;
        log::trace!("pop scope {:?}", id);
        self.arena
            .try_remove(id.into())
            .ok_or(ScopeError::NotOpen(id))
    }

    pub fn pop_function(&mut self) -> Result<FuncInfo, ScopeError> {
        let id = self.current()?;
        let scope = self.pop()?;
        let ScopeKind::Function(func) = scope.kind else {
            return Err(ScopeError::NotAFunction(id));
        };
        let (parent_captures, captures): (Vec<_>, Vec<_>) = func.captures.into_values().unzip();
        Ok(FuncInfo {
            vars: scope.vars.into_values().collect(),
            local_count: func.next_slot,
            captures,
            parent_captures,
        })
    }

    pub fn current(&self) -> Result<ScopeID, ScopeError> {
        self.stack.last().copied().ok_or(ScopeError::EmptyStack)
    }

    /// Open scopes, innermost first.
    pub fn open(&self) -> impl Iterator<Item = ScopeID> + '_ {
        self.stack.iter().rev().copied()
    }

    pub fn get(&self, scope: ScopeID) -> Result<&Scope, ScopeError> {
        self.arena.get(scope.into()).ok_or(ScopeError::NotOpen(scope))
    }
    fn get_mut(&mut self, scope: ScopeID) -> Result<&mut Scope, ScopeError> {
        self.arena
            .get_mut(scope.into())
            .ok_or(ScopeError::NotOpen(scope))
    }

    pub fn lookup_local(&self, scope: ScopeID, name: Spur) -> Option<Variable> {
        self.arena
            .get(scope.into())
            .and_then(|s| s.vars.get(&name).copied())
    }

    pub fn lookup_capture(&self, scope: ScopeID, name: Spur) -> Option<Variable> {
        match &self.arena.get(scope.into())?.kind {
            ScopeKind::Function(f) => f.captures.get(&name).map(|(_, child)| *child),
            _ => None,
        }
    }

    /// The nearest function scope at or outside `scope` on the open stack.
    pub fn enclosing_function(&self, scope: ScopeID) -> Result<ScopeID, ScopeError> {
        let pos = self
            .stack
            .iter()
            .rposition(|s| *s == scope)
            .ok_or(ScopeError::NotOpen(scope))?;
        self.stack[..=pos]
            .iter()
            .rev()
            .copied()
            .find(|s| matches!(self.arena[usize::from(*s)].kind, ScopeKind::Function(_)))
            .ok_or(ScopeError::NoEnclosingFunction(scope))
    }

    fn alloc_slot(&mut self, func: ScopeID) -> Result<u16, ScopeError> {
        let max = self.max_locals;
        let ScopeKind::Function(f) = &mut self.get_mut(func)?.kind else {
            return Err(ScopeError::NotAFunction(func));
        };
        if f.exhausted || f.next_slot >= max {
            let first = !f.exhausted;
            f.exhausted = true;
            return Err(ScopeError::TooManyLocals { scope: func, first });
        }
        let slot = f.next_slot as u16;
        f.next_slot += 1;
        Ok(slot)
    }

    /// Binds `name` in `scope` with a slot from the nearest enclosing function.
    ///
    /// Callers check [`ScopeStack::lookup_local`] first; redeclaring here is a
    /// contract violation.
    pub fn declare(
        &mut self,
        scope: ScopeID,
        name: Spur,
        is_const: bool,
        ids: &mut VarCounter,
    ) -> Result<Variable, ScopeError> {
        let target = self.get(scope)?;
        if target.vars.contains_key(&name) {
            return Err(ScopeError::AlreadyDefined(scope));
        }
        if matches!(target.kind, ScopeKind::Struct) && !target.vars.is_empty() {
            return Err(ScopeError::StructScopeOccupied(scope));
        }

        let func = self.enclosing_function(scope)?;
        let slot = self.alloc_slot(func)?;
        let var = Variable {
            id: ids.next_id(),
            symbol: name,
            slot,
            is_const,
            is_capture: false,
        };
        self.get_mut(scope)?.vars.insert(name, var);
        Ok(var)
    }

    /// Adds a capture cell for `parent` to the capture table of `func`.
    pub fn capture(
        &mut self,
        func: ScopeID,
        parent: Variable,
        ids: &mut VarCounter,
    ) -> Result<Variable, ScopeError> {
        let max = self.max_locals;
        let ScopeKind::Function(f) = &mut self.get_mut(func)?.kind else {
            return Err(ScopeError::NotAFunction(func));
        };
        if let Some((_, child)) = f.captures.get(&parent.symbol) {
            return Ok(*child);
        }
        if f.captures.len() >= max {
            let first = !f.exhausted;
            f.exhausted = true;
            return Err(ScopeError::TooManyLocals { scope: func, first });
        }
        let child = Variable {
            id: ids.next_id(),
            symbol: parent.symbol,
            slot: f.captures.len() as u16,
            is_const: parent.is_const,
            is_capture: true,
        };
        f.captures.insert(parent.symbol, (parent, child));
        Ok(child)
    }
}
