//! Embedded query collaborator interface.
//!
//! The engine does not store records. An embedded query is handed to a host
//! [`QueryRunner`] together with a [`BindEvaluator`] through which the
//! runner asks for the values of the query's bind variables. The runner
//! answers with records of the query's object type; the interpreter wraps
//! them in a `List` of that type.

use thiserror::Error;

use apex_core::{DataType, Value};

/// Failure reported by a [`QueryRunner`].
///
/// Surfaces in the program as a catchable `QueryException` carrying the
/// error's message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("{0}")]
    Failed(String),

    #[error("unknown bind variable `{name}`")]
    UnknownBind { name: String },

    /// A bind expression raised or failed; the interpreter rethrows the
    /// original failure.
    #[error("bind variable `{name}` could not be evaluated")]
    BindFailed { name: String },
}

/// One query as seen by the runner.
#[derive(Debug, Clone)]
pub struct QueryRequest<'q> {
    /// Query text as written, binds included.
    pub query: &'q str,
    /// Record type of the result.
    pub object: &'q DataType,
    /// Names of the bind variables, in source order.
    pub binds: Vec<&'q str>,
}

impl QueryRequest<'_> {
    /// A new record of the query's object type with `fields` set.
    pub fn record(&self, fields: &[(&str, Value)]) -> Value {
        let record = Value::new_object(self.object.clone());
        if let Some(obj) = record.as_object() {
            let mut obj = obj.borrow_mut();
            for (name, value) in fields {
                obj.fields.insert(*name, value.clone());
            }
        }
        record
    }
}

/// Evaluates bind variables of the query being run.
pub trait BindEvaluator {
    /// Value of the bind variable `name` (without the leading colon).
    fn evaluate(&mut self, name: &str) -> Result<Value, QueryError>;
}

/// Host collaborator answering embedded queries.
pub trait QueryRunner {
    fn run(
        &self,
        request: &QueryRequest<'_>,
        binds: &mut dyn BindEvaluator,
    ) -> Result<Vec<Value>, QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_core::TypeHash;

    #[test]
    fn record_sets_fields_case_insensitively() {
        let object = DataType::simple(TypeHash::from_name("schema.account"), "Account");
        let request = QueryRequest {
            query: "SELECT Name FROM Account",
            object: &object,
            binds: Vec::new(),
        };
        let record = request.record(&[("Name", "Acme".into())]);
        let obj = record.as_object().unwrap().borrow();
        assert_eq!(obj.class, object);
        assert_eq!(obj.fields.get("name").and_then(Value::as_str), Some("Acme"));
    }
}
