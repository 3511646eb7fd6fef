//! Schema-described record classes.
//!
//! External metadata describes objects as a field list. Each object becomes
//! an ordinary [`ClassType`] of kind [`ClassKind::SObject`] in the
//! [`SCHEMA_NAMESPACE`], extending the platform `SObject` class and carrying
//! an implicit `Id` field. Field types are left as written; the type
//! reference resolver resolves them together with the user classes, so a
//! lookup field may name another schema object.

use apex_core::{DataType, IdentMap, Modifiers, RegistrationError, TypeHash, TypeRef, builtins};

use crate::class_type::{ClassKind, ClassType, Field};
use crate::store::{NamespaceStore, SCHEMA_NAMESPACE};

/// One field of a schema object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    /// Type as written, e.g. `String` or `Account`.
    pub type_name: String,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Object name to field list.
#[derive(Debug, Clone, Default)]
pub struct SchemaMap {
    objects: IdentMap<Vec<SchemaField>>,
}

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SchemaMap::insert`] taking `(name, type)` pairs.
    pub fn with_object(mut self, name: &str, fields: &[(&str, &str)]) -> Self {
        self.insert(
            name,
            fields.iter().map(|(n, t)| SchemaField::new(*n, *t)).collect(),
        );
        self
    }

    pub fn insert(&mut self, name: &str, fields: Vec<SchemaField>) {
        self.objects.insert(name, fields);
    }

    pub fn fields(&self, object: &str) -> Option<&[SchemaField]> {
        self.objects.get(object).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SchemaField])> {
        self.objects.iter().map(|(name, fields)| (name, fields.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Register one class per schema object.
pub fn register_schema(
    store: &mut NamespaceStore,
    schema: &SchemaMap,
) -> Result<Vec<TypeHash>, RegistrationError> {
    let mut hashes = Vec::with_capacity(schema.len());
    for (object, fields) in schema.iter() {
        hashes.push(store.register_class(schema_class(object, fields)?)?);
    }
    Ok(hashes)
}

fn schema_class(object: &str, fields: &[SchemaField]) -> Result<ClassType, RegistrationError> {
    let invalid = |message: String| RegistrationError::InvalidSchema {
        object: object.to_string(),
        message,
    };
    if object.is_empty() || object.contains('.') {
        return Err(invalid(format!("`{object}` is not a valid object name")));
    }

    let public = Modifiers::PUBLIC;
    let mut class = ClassType::in_namespace(SCHEMA_NAMESPACE, object, ClassKind::SObject)
        .with_super(TypeRef::builtin(builtins::SOBJECT, "SObject"))
        .with_field(
            Field::new("Id", TypeRef::resolved_to(DataType::string())).with_modifiers(public),
        );

    for field in fields {
        if field.name.is_empty() || field.type_name.is_empty() {
            return Err(invalid("field with empty name or type".into()));
        }
        if field.name.eq_ignore_ascii_case("id") {
            continue;
        }
        let type_ref = TypeRef::new(&field.type_name);
        if class
            .add_field(Field::new(field.name.as_str(), type_ref).with_modifiers(public))
            .is_some()
        {
            return Err(invalid(format!("field `{}` is duplicated", field.name)));
        }
    }
    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_register_in_schema_namespace() {
        let schema = SchemaMap::new()
            .with_object("Account", &[("Name", "String"), ("NumberOfEmployees", "Integer")])
            .with_object("Contact", &[("LastName", "String"), ("Account", "Account")]);
        let mut store = NamespaceStore::new();
        let hashes = register_schema(&mut store, &schema).unwrap();
        assert_eq!(hashes.len(), 2);

        let account = store.lookup_namespace("schema", "account").unwrap();
        let class = store.class(account).unwrap();
        assert_eq!(class.kind, ClassKind::SObject);
        assert_eq!(class.superclass(), Some(builtins::SOBJECT));
        assert!(class.instance_fields.contains("id"));
        assert!(class.instance_fields.contains("name"));
        assert_eq!(class.qualified_name, "Schema.Account");
    }

    #[test]
    fn explicit_id_field_is_not_duplicated() {
        let schema = SchemaMap::new().with_object("Lead", &[("Id", "String")]);
        let mut store = NamespaceStore::new();
        register_schema(&mut store, &schema).unwrap();
        let lead = store.lookup_namespace(SCHEMA_NAMESPACE, "Lead").unwrap();
        assert_eq!(store.class(lead).unwrap().instance_fields.len(), 1);
    }

    #[test]
    fn duplicate_field_is_invalid() {
        let schema = SchemaMap::new()
            .with_object("Case", &[("Subject", "String"), ("subject", "String")]);
        let mut store = NamespaceStore::new();
        let err = register_schema(&mut store, &schema).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidSchema { .. }));
    }
}
