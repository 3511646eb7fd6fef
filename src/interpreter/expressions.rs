//! Expression evaluation.

use apex_ast::{
    Assignment, Binary, BinaryOp, Cast, Literal, NodeKind, NodeRef, Soql, SoqlBind, Unary, UnaryOp,
};
use apex_core::{Location, Payload, ResolutionError, RuntimeError, Value, builtins};

use super::fields::Place;
use super::operators::{self, OperatorFault};
use super::{Eval, Interpreter, Unwind, coerce};
use crate::query::{BindEvaluator, QueryError, QueryRequest};

impl Interpreter<'_> {
    /// Evaluate one expression.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn eval(&mut self, node: &NodeRef) -> Eval<Value> {
        self.step()?;
        let at = &node.location;
        match &node.kind {
            NodeKind::Literal(literal) => Ok(match literal {
                Literal::Integer(i) => Value::Integer(*i),
                Literal::Double(d) => Value::Double(*d),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
            }),
            NodeKind::Name(name) => {
                let resolved = self.resolver().resolve_variable(&name.names, at)?;
                self.read_resolved(&resolved, at)
            }
            NodeKind::FieldAccess(access) => {
                if let NodeKind::Name(receiver) = &access.receiver.kind {
                    let mut names = receiver.names.clone();
                    names.push(access.name.clone());
                    let resolved = self.resolver().resolve_variable(&names, at)?;
                    return self.read_resolved(&resolved, at);
                }
                let target = self.eval(&access.receiver)?;
                self.read_field(&target, &access.name, at)
            }
            NodeKind::MethodInvocation(call) => self.eval_call(call, at),
            NodeKind::New(expr) => self.eval_new(expr, at),
            NodeKind::Cast(expr) => self.eval_cast(expr, at),
            NodeKind::InstanceOf(expr) => {
                let value = self.eval(&expr.expr)?;
                let ty = self.resolve_type(&expr.type_ref, at)?;
                let is = !value.is_null() && self.store.is_assignable(&value.data_type(), &ty);
                Ok(Value::Boolean(is))
            }
            NodeKind::Binary(expr) => self.eval_binary(expr, at),
            NodeKind::Unary(expr) => self.eval_unary(expr, at),
            NodeKind::Assignment(expr) => self.eval_assignment(expr, at),
            NodeKind::Ternary(expr) => {
                if self.eval_condition(&expr.condition)? {
                    self.eval(&expr.then_expr)
                } else {
                    self.eval(&expr.else_expr)
                }
            }
            NodeKind::This | NodeKind::Super => {
                let frame = self.frame();
                if frame.is_static {
                    return Err(ResolutionError::StaticContext {
                        name: node.kind_name().to_string(),
                        location: at.clone(),
                    }
                    .into());
                }
                Ok(frame.this.clone())
            }
            NodeKind::ArrayAccess(expr) => {
                let collection = self.eval(&expr.receiver)?;
                let index = self.eval(&expr.index)?;
                self.index_get(&collection, &index, at)
            }
            NodeKind::Soql(query) => self.eval_soql(query, at),
            other => Err(RuntimeError::Unsupported {
                message: format!("{} is not an expression", other.name()),
                location: at.clone(),
            }
            .into()),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn eval_binary(&mut self, expr: &Binary, at: &Location) -> Eval<Value> {
        if expr.op.is_short_circuit() {
            let left = self.eval_condition(&expr.left)?;
            let decided = match expr.op {
                BinaryOp::LogicalAnd => !left,
                _ => left,
            };
            if decided {
                return Ok(Value::Boolean(left));
            }
            return Ok(Value::Boolean(self.eval_condition(&expr.right)?));
        }
        let left = self.eval(&expr.left)?;
        let right = self.eval(&expr.right)?;
        self.apply_binary(expr.op, &left, &right, at)
    }

    /// `left op right` on evaluated operands. `+` with a String on either
    /// side concatenates the rendered operands.
    pub(crate) fn apply_binary(
        &self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        at: &Location,
    ) -> Eval<Value> {
        if op == BinaryOp::Add
            && (matches!(left, Value::String(_)) || matches!(right, Value::String(_)))
        {
            return Ok(Value::String(format!("{}{}", self.render(left), self.render(right))));
        }
        operators::binary(op, left, right).map_err(|fault| match fault {
            OperatorFault::DivideByZero => self.raise(builtins::MATH_EXCEPTION, "Divide by 0"),
            OperatorFault::NullOperand => self.null_pointer(),
            OperatorFault::Unsupported => Unwind::Fatal(RuntimeError::UnsupportedOperator {
                op: op.as_str().to_string(),
                left: left.type_name(),
                right: right.type_name(),
                location: at.clone(),
            }),
        })
    }

    fn eval_unary(&mut self, expr: &Unary, at: &Location) -> Eval<Value> {
        if expr.op.is_mutating() {
            let place = self.place_of_expr(&expr.operand)?;
            let old = self.read_place(&place, at)?;
            let step = match expr.op {
                UnaryOp::PreInc | UnaryOp::PostInc => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            if !matches!(old, Value::Integer(_) | Value::Double(_) | Value::Null) {
                return Err(unary_mismatch(expr.op, &old, at));
            }
            let new = self.apply_binary(step, &old, &Value::Integer(1), at)?;
            self.write_place(&place, new.clone(), at)?;
            return Ok(match expr.op {
                UnaryOp::PreInc | UnaryOp::PreDec => new,
                _ => old,
            });
        }
        let operand = self.eval(&expr.operand)?;
        operators::unary(expr.op, &operand).map_err(|fault| match fault {
            OperatorFault::NullOperand => self.null_pointer(),
            _ => unary_mismatch(expr.op, &operand, at),
        })
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    fn eval_assignment(&mut self, expr: &Assignment, at: &Location) -> Eval<Value> {
        let place = self.place_of_expr(&expr.target)?;
        let value = match expr.op {
            None => self.eval(&expr.value)?,
            Some(op) => {
                let current = self.read_place(&place, at)?;
                let operand = self.eval(&expr.value)?;
                self.apply_binary(op, &current, &operand, at)?
            }
        };
        self.write_place(&place, value.clone(), at)?;
        Ok(value)
    }

    /// The location an assignment target names.
    fn place_of_expr(&mut self, target: &NodeRef) -> Eval<Place> {
        let at = &target.location;
        match &target.kind {
            NodeKind::Name(name) => {
                let resolved = self.resolver().resolve_variable(&name.names, at)?;
                self.place_of(&resolved, at)
            }
            NodeKind::FieldAccess(access) => {
                if let NodeKind::Name(receiver) = &access.receiver.kind {
                    let mut names = receiver.names.clone();
                    names.push(access.name.clone());
                    let resolved = self.resolver().resolve_variable(&names, at)?;
                    return self.place_of(&resolved, at);
                }
                let object = self.eval(&access.receiver)?;
                Ok(Place::Field {
                    object,
                    name: access.name.clone(),
                })
            }
            NodeKind::ArrayAccess(access) => {
                let collection = self.eval(&access.receiver)?;
                let index = self.eval(&access.index)?;
                Ok(Place::Index { collection, index })
            }
            _ => Err(RuntimeError::InvalidAssignmentTarget {
                location: at.clone(),
            }
            .into()),
        }
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    fn eval_cast(&mut self, expr: &Cast, at: &Location) -> Eval<Value> {
        let value = self.eval(&expr.expr)?;
        let ty = self.resolve_type(&expr.type_ref, at)?;
        match &value {
            Value::Null => Ok(value),
            Value::Double(d) if ty.is(builtins::INTEGER) => Ok(Value::Integer(d.trunc() as i64)),
            _ if self.store.is_assignable(&value.data_type(), &ty) => Ok(coerce(&ty, value)),
            _ => Err(self.raise(
                builtins::TYPE_EXCEPTION,
                format!(
                    "Invalid conversion from runtime type {} to {ty}",
                    value.type_name()
                ),
            )),
        }
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    /// `list[i]` or `map[key]`.
    pub(crate) fn index_get(
        &mut self,
        collection: &Value,
        index: &Value,
        at: &Location,
    ) -> Eval<Value> {
        self.check_indexable(collection, at)?;
        self.call_on_value(collection, "get", vec![index.clone()], at)
    }

    /// `list[i] = v` or `map[key] = v`.
    pub(crate) fn index_set(
        &mut self,
        collection: &Value,
        index: Value,
        value: Value,
        at: &Location,
    ) -> Eval<()> {
        let method = match self.check_indexable(collection, at)? {
            Indexable::List => "set",
            Indexable::Map => "put",
        };
        self.call_on_value(collection, method, vec![index, value], at)?;
        Ok(())
    }

    fn check_indexable(&self, collection: &Value, at: &Location) -> Eval<Indexable> {
        match collection {
            Value::Null => Err(self.null_pointer()),
            Value::Object(obj) => match obj.borrow().payload {
                Payload::List(_) => Ok(Indexable::List),
                Payload::Map(_) => Ok(Indexable::Map),
                _ => Err(not_indexable(collection, at)),
            },
            _ => Err(not_indexable(collection, at)),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Hand an embedded query to the configured runner.
    ///
    /// Bind expressions are evaluated lazily, when the runner asks for them,
    /// in the scope of the query. A bind that raises aborts the query with
    /// that exception; a runner failure raises `QueryException`.
    fn eval_soql(&mut self, query: &Soql, at: &Location) -> Eval<Value> {
        let Some(runner) = self.query_runner else {
            return Err(self.raise(builtins::QUERY_EXCEPTION, "No query runner is configured"));
        };
        let object = self.resolve_type(&query.object, at)?;
        let request = QueryRequest {
            query: &query.query,
            object: &object,
            binds: query.binds.iter().map(|b| bind_name(&b.name)).collect(),
        };
        let mut binds = Binds {
            interpreter: self,
            binds: &query.binds,
            pending: None,
        };
        let result = runner.run(&request, &mut binds);
        if let Some(unwind) = binds.pending.take() {
            return Err(unwind);
        }
        match result {
            Ok(records) => Ok(Value::list(object.clone(), records)),
            Err(error) => Err(self.raise(builtins::QUERY_EXCEPTION, error.to_string())),
        }
    }
}

enum Indexable {
    List,
    Map,
}

fn not_indexable(collection: &Value, at: &Location) -> Unwind {
    RuntimeError::TypeMismatch {
        expected: "List or Map".to_string(),
        actual: collection.type_name(),
        location: at.clone(),
    }
    .into()
}

fn unary_mismatch(op: UnaryOp, operand: &Value, at: &Location) -> Unwind {
    RuntimeError::TypeMismatch {
        expected: format!("an operand for `{op}`"),
        actual: operand.type_name(),
        location: at.clone(),
    }
    .into()
}

fn bind_name(name: &str) -> &str {
    name.trim_start_matches(':')
}

/// Evaluates bind variables for a running query.
struct Binds<'i, 'a> {
    interpreter: &'i mut Interpreter<'a>,
    binds: &'i [SoqlBind],
    /// First failure raised by a bind expression.
    pending: Option<Unwind>,
}

impl BindEvaluator for Binds<'_, '_> {
    fn evaluate(&mut self, name: &str) -> Result<Value, QueryError> {
        let name = bind_name(name);
        let Some(bind) = self
            .binds
            .iter()
            .find(|b| bind_name(&b.name).eq_ignore_ascii_case(name))
        else {
            return Err(QueryError::UnknownBind {
                name: name.to_string(),
            });
        };
        match self.interpreter.eval(&bind.expr) {
            Ok(value) => Ok(value),
            Err(unwind) => {
                self.pending.get_or_insert(unwind);
                Err(QueryError::BindFailed {
                    name: name.to_string(),
                })
            }
        }
    }
}
