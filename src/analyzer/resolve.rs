use lasso::Spur;

use super::{
    error::{ScopeError, SemanticError},
    scope::{ScopeKind, Variable},
    AnalyzeResult, Analyzer,
};
use crate::source::CodeSpan;

/// Outcome of resolving a name against the open scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(Variable),
    Undefined,
    /// Resolution hit a limit that has already been reported.
    Failed,
}

impl<'a> Analyzer<'a> {
    /// Resolves `name` from the innermost open scope outward.
    ///
    /// Every function scope crossed before the binding is found gets a capture
    /// cell chained to the one outside it, outermost first. A function that
    /// already captured `name` ends the walk like a declaration would, unless
    /// it has since declared its own `name`.
    pub(super) fn resolve(&mut self, name: Spur, span: CodeSpan) -> AnalyzeResult<Lookup> {
        let mut crossed = vec![];
        let mut found = None;

        for id in self.scopes.open() {
            if let Some(var) = self.scopes.lookup_local(id, name) {
                found = Some(var);
                break;
            }
            if let Some(cell) = self.scopes.lookup_capture(id, name) {
                found = Some(cell);
                break;
            }
            if let ScopeKind::Function(_) = self.scopes.get(id)?.kind {
                crossed.push(id);
            }
        }

        let Some(mut var) = found else {
            return Ok(Lookup::Undefined);
        };

        if !crossed.is_empty() {
            log::debug!(
                "capturing `{}` through {} function(s)",
                self.interner.resolve(&name),
                crossed.len()
            );
        }
        for func in crossed.into_iter().rev() {
            var = match self.scopes.capture(func, var, &mut self.var_ids) {
                Ok(child) => child,
                Err(ScopeError::TooManyLocals { first, .. }) => {
                    if first {
                        self.too_many_locals(span);
                    }
                    return Ok(Lookup::Failed);
                }
                Err(e) => return Err(e),
            };
        }

        Ok(Lookup::Found(var))
    }

    pub(super) fn too_many_locals(&mut self, span: CodeSpan) {
        self.errors.push(SemanticError::TooManyLocals {
            limit: self.scopes.max_locals(),
            area: self.make_area(span),
        })
    }
}
