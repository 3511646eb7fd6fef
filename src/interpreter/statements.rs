//! Statement execution.

use apex_ast::{Block, EnhancedFor, For, LocalVariableDeclaration, NodeKind, NodeRef, Try};
use apex_core::{Location, Payload, RuntimeError, Value, builtins};

use super::{ControlFlow, Eval, Interpreter, Unwind, attempt};

type Exec = Result<ControlFlow, RuntimeError>;

impl Interpreter<'_> {
    /// Execute one statement.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn exec(&mut self, node: &NodeRef) -> Exec {
        self.step()?;
        match &node.kind {
            NodeKind::Block(block) => self.exec_block(block),
            NodeKind::LocalVariable(decl) => self.exec_local(decl, &node.location),
            NodeKind::ExpressionStatement(stmt) => {
                attempt!(self.eval(&stmt.expr));
                Ok(ControlFlow::Normal)
            }
            NodeKind::If(stmt) => {
                if attempt!(self.eval_condition(&stmt.condition)) {
                    self.exec(&stmt.then_branch)
                } else if let Some(else_branch) = &stmt.else_branch {
                    self.exec(else_branch)
                } else {
                    Ok(ControlFlow::Normal)
                }
            }
            NodeKind::For(stmt) => self.scoped(|this| this.exec_for(stmt)),
            NodeKind::EnhancedFor(stmt) => self.exec_enhanced_for(stmt, &node.location),
            NodeKind::While(stmt) => {
                while attempt!(self.eval_condition(&stmt.condition)) {
                    match self.exec(&stmt.body)? {
                        ControlFlow::Break => break,
                        ControlFlow::Normal | ControlFlow::Continue => {}
                        other => return Ok(other),
                    }
                }
                Ok(ControlFlow::Normal)
            }
            NodeKind::DoWhile(stmt) => {
                loop {
                    match self.exec(&stmt.body)? {
                        ControlFlow::Break => break,
                        ControlFlow::Normal | ControlFlow::Continue => {}
                        other => return Ok(other),
                    }
                    if !attempt!(self.eval_condition(&stmt.condition)) {
                        break;
                    }
                }
                Ok(ControlFlow::Normal)
            }
            NodeKind::Return(stmt) => {
                let value = match &stmt.value {
                    Some(expr) => attempt!(self.eval(expr)),
                    None => Value::Null,
                };
                Ok(ControlFlow::Return(value))
            }
            NodeKind::Break => Ok(ControlFlow::Break),
            NodeKind::Continue => Ok(ControlFlow::Continue),
            NodeKind::Throw(stmt) => {
                let exception = attempt!(self.eval(&stmt.expr));
                if exception.is_null() {
                    return Ok(ControlFlow::Raise(self.null_exception()));
                }
                let ty = exception.data_type();
                if !self.store.is_subclass_of(ty.base, builtins::EXCEPTION)
                    && !ty.is(builtins::EXCEPTION)
                {
                    return Err(RuntimeError::TypeMismatch {
                        expected: "Exception".to_string(),
                        actual: ty.to_string(),
                        location: node.location.clone(),
                    });
                }
                Ok(ControlFlow::Raise(exception))
            }
            NodeKind::Try(stmt) => self.exec_try(stmt),
            // A bare expression in statement position, e.g. a `for` initializer.
            _ if !node.is_statement() => {
                attempt!(self.eval(node));
                Ok(ControlFlow::Normal)
            }
            other => Err(RuntimeError::Unsupported {
                message: format!("{} is not executable", other.name()),
                location: node.location.clone(),
            }),
        }
    }

    /// Run `f` inside a fresh lexical scope.
    fn scoped(&mut self, f: impl FnOnce(&mut Self) -> Exec) -> Exec {
        self.frame_mut().env.push_scope();
        let flow = f(self);
        self.frame_mut().env.pop_scope();
        flow
    }

    fn exec_block(&mut self, block: &Block) -> Exec {
        self.scoped(|this| {
            for statement in &block.statements {
                let flow = this.exec(statement)?;
                if !flow.is_normal() {
                    return Ok(flow);
                }
            }
            Ok(ControlFlow::Normal)
        })
    }

    fn exec_local(&mut self, decl: &LocalVariableDeclaration, location: &Location) -> Exec {
        let ty = self.resolve_type(&decl.type_ref, location)?;
        for declarator in &decl.declarators {
            let Some(var) = declarator.as_declarator() else {
                continue;
            };
            let value = match &var.init {
                Some(init) => attempt!(self.eval(init)),
                None => Value::Null,
            };
            self.frame_mut().define(&var.name, ty.clone(), value);
        }
        Ok(ControlFlow::Normal)
    }

    /// `for (init; condition; update)`. `continue` still runs the update;
    /// `break` leaves before it.
    fn exec_for(&mut self, stmt: &For) -> Exec {
        for init in &stmt.init {
            let flow = self.exec(init)?;
            if !flow.is_normal() {
                return Ok(flow);
            }
        }
        loop {
            if let Some(condition) = &stmt.condition
                && !attempt!(self.eval_condition(condition))
            {
                break;
            }
            match self.exec(&stmt.body)? {
                ControlFlow::Break => break,
                ControlFlow::Normal | ControlFlow::Continue => {}
                other => return Ok(other),
            }
            for update in &stmt.update {
                attempt!(self.eval(update));
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_enhanced_for(&mut self, stmt: &EnhancedFor, location: &Location) -> Exec {
        let iterable = attempt!(self.eval(&stmt.iterable));
        // Iterate a snapshot so the body may modify the collection.
        let items: Option<Vec<Value>> = match &iterable {
            Value::Null => return Ok(ControlFlow::Raise(self.null_exception())),
            Value::Object(obj) => match &obj.borrow().payload {
                Payload::List(items) => Some(items.clone()),
                Payload::Set(entries) => Some(entries.keys().cloned().collect()),
                _ => None,
            },
            _ => None,
        };
        let Some(items) = items else {
            return Err(RuntimeError::NotIterable {
                type_name: iterable.type_name(),
                location: location.clone(),
            });
        };

        let ty = self.resolve_type(&stmt.type_ref, location)?;
        for item in items {
            let flow = self.scoped(|this| {
                this.frame_mut().define(&stmt.name, ty.clone(), item);
                this.exec(&stmt.body)
            })?;
            match flow {
                ControlFlow::Break => break,
                ControlFlow::Normal | ControlFlow::Continue => {}
                other => return Ok(other),
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// `try`/`catch`/`finally`.
    ///
    /// The first clause whose type accepts the raised exception handles it.
    /// `finally` runs after any normal or abrupt completion of the rest and
    /// replaces that completion when it is itself abrupt. Fatal runtime
    /// errors propagate without running it.
    fn exec_try(&mut self, stmt: &Try) -> Exec {
        let mut flow = self.exec(&stmt.block)?;
        if let ControlFlow::Raise(exception) = &flow
            && let Some(handled) = self.exec_catch(&stmt.catches, exception)?
        {
            flow = handled;
        }
        if let Some(finally) = &stmt.finally {
            let after = self.exec(finally)?;
            if !after.is_normal() {
                return Ok(after);
            }
        }
        Ok(flow)
    }

    fn exec_catch(
        &mut self,
        catches: &[NodeRef],
        exception: &Value,
    ) -> Result<Option<ControlFlow>, RuntimeError> {
        let raised = exception.data_type();
        for node in catches {
            let Some(clause) = node.as_catch() else {
                continue;
            };
            let ty = self.resolve_type(&clause.type_ref, &node.location)?;
            if !self.store.is_assignable(&raised, &ty) {
                continue;
            }
            let exception = exception.clone();
            let flow = self.scoped(|this| {
                this.frame_mut().define(&clause.name, ty, exception);
                this.exec(&clause.block)
            })?;
            return Ok(Some(flow));
        }
        Ok(None)
    }

    /// Evaluate a loop or branch condition.
    pub(crate) fn eval_condition(&mut self, expr: &NodeRef) -> Eval<bool> {
        match self.eval(expr)? {
            Value::Boolean(b) => Ok(b),
            Value::Null => Err(self.null_pointer()),
            other => Err(Unwind::Fatal(RuntimeError::TypeMismatch {
                expected: "Boolean".to_string(),
                actual: other.type_name(),
                location: expr.location.clone(),
            })),
        }
    }
}
