use super::{
    error::{ScopeError, SemanticError},
    resolve::Lookup,
    AnalyzeResult, Analyzer,
};
use crate::{parser::ast::ThisNode, source::CodeSpan};

impl<'a> Analyzer<'a> {
    /// `this` is bound lazily in the innermost open struct scope, with a slot
    /// from the function around that struct. After that it resolves (and is
    /// captured into methods) like any other name.
    pub(super) fn visit_this(&mut self, node: &mut ThisNode, span: CodeSpan) -> AnalyzeResult<()> {
        let Some(&owner) = self.structs.last() else {
            self.errors.push(SemanticError::ThisOutsideStruct {
                area: self.make_area(span),
            });
            return Ok(());
        };

        if self.scopes.lookup_local(owner, self.this_sym).is_none()
            && self.declare_in(owner, self.this_sym, true, span)?.is_none()
        {
            return Ok(());
        }

        match self.resolve(self.this_sym, span)? {
            Lookup::Found(var) => node.var = Some(var),
            Lookup::Failed => {}
            Lookup::Undefined => return Err(ScopeError::SelfBindingLost(owner)),
        }
        Ok(())
    }
}
