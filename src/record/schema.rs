//! Logical relation schemas.

use std::collections::HashMap;

use crate::datum::Type;

use super::error::RecordError;

/// Per-field metadata held by a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldInfo {
    ty: Type,
    /// Declared maximum character length. Meaningful for varchar fields
    /// only; 0 for integers.
    length: usize,
}

/// The logical description of a relation: an ordered list of uniquely-named
/// fields with types and declared lengths.
///
/// Schemas are value types; plans copy and combine them freely. Field names
/// are unique within a schema, and concatenating two schemas (to form a
/// join operator's output schema) requires their field-name sets to be
/// disjoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<String>,
    info: HashMap<String, FieldInfo>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an integer field.
    ///
    /// # Errors
    ///
    /// [`RecordError::DuplicateField`] if the name is already present.
    pub fn add_int_field(&mut self, name: impl Into<String>) -> Result<(), RecordError> {
        self.add(name.into(), Type::Integer, 0)
    }

    /// Adds a string field with a declared maximum character length.
    ///
    /// # Errors
    ///
    /// [`RecordError::DuplicateField`] if the name is already present.
    pub fn add_string_field(
        &mut self,
        name: impl Into<String>,
        length: usize,
    ) -> Result<(), RecordError> {
        self.add(name.into(), Type::Varchar, length)
    }

    /// Copies the named field (type and length) from another schema.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownField`] if `other` lacks the field;
    /// [`RecordError::DuplicateField`] if this schema already has it.
    pub fn add_from(&mut self, name: &str, other: &Schema) -> Result<(), RecordError> {
        let info = other
            .info
            .get(name)
            .ok_or_else(|| RecordError::UnknownField(name.to_string()))?;
        self.add(name.to_string(), info.ty, info.length)
    }

    /// Copies every field of another schema, preserving order.
    ///
    /// # Errors
    ///
    /// [`RecordError::DuplicateField`] if the field-name sets overlap —
    /// concatenation is only defined for disjoint schemas.
    pub fn add_all(&mut self, other: &Schema) -> Result<(), RecordError> {
        for name in &other.fields {
            self.add_from(name, other)?;
        }
        Ok(())
    }

    fn add(&mut self, name: String, ty: Type, length: usize) -> Result<(), RecordError> {
        if self.info.contains_key(&name) {
            return Err(RecordError::DuplicateField(name));
        }
        self.info.insert(name.clone(), FieldInfo { ty, length });
        self.fields.push(name);
        Ok(())
    }

    /// Returns the field names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns whether the schema contains the named field.
    pub fn has_field(&self, name: &str) -> bool {
        self.info.contains_key(name)
    }

    /// Returns the named field's type.
    pub fn field_type(&self, name: &str) -> Result<Type, RecordError> {
        self.info
            .get(name)
            .map(|i| i.ty)
            .ok_or_else(|| RecordError::UnknownField(name.to_string()))
    }

    /// Returns the named field's declared maximum length.
    pub fn field_length(&self, name: &str) -> Result<usize, RecordError> {
        self.info
            .get(name)
            .map(|i| i.length)
            .ok_or_else(|| RecordError::UnknownField(name.to_string()))
    }

    /// Builds the schema containing exactly `fields`, copied from this one.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownField`] if any requested field is missing —
    /// a projection over an absent field is a configuration error, never a
    /// silent omission.
    pub fn project(&self, fields: &[String]) -> Result<Schema, RecordError> {
        let mut out = Schema::new();
        for name in fields {
            out.add_from(name, self)?;
        }
        Ok(out)
    }
}
