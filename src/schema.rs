//! Schema model describing expected query parameter shapes.
//!
//! A [`Schema`] is a tagged union built once at route-definition time and
//! never mutated. The codec drives all of its decisions off this model:
//!
//! - [`Schema::Object`] — a record of named fields.
//! - [`Schema::Optional`] — the wrapped field may be absent.
//! - [`Schema::Default`] — the wrapped field falls back to a default value
//!   when absent (or when its raw value fails to convert).
//! - [`Schema::Union`] — a union of record shapes, tried in declaration
//!   order. Every variant is an [`ObjectSchema`] by construction, so the
//!   "union of objects only" invariant cannot be violated at decode time.
//! - [`Schema::Array`] — an array of scalar elements. The element kind is
//!   a [`PrimitiveKind`], so an unsupported element type is unrepresentable.
//! - [`Schema::Primitive`] — a scalar (`number`, `boolean`, `string`).
//!
//! # Example
//!
//! ```
//! use query_state::schema::{array, number, object, string, PrimitiveKind};
//! use serde_json::json;
//!
//! let schema = object([
//!     ("page", number().default_value(1)),
//!     ("tags", array(PrimitiveKind::String).optional()),
//!     ("q", string().optional()),
//! ]);
//!
//! // Default realization: validating "nothing" yields the defaults.
//! let state = schema.validate(Some(&json!({}))).unwrap();
//! assert_eq!(state, json!({ "page": 1 }));
//! ```

use crate::error::ValidationError;
use serde_json::{Map, Value};

// ============================================================================
// Primitive kinds
// ============================================================================

/// Scalar kinds a query parameter value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// A floating point number (integral values are kept as integers).
    Number,
    /// Exactly `true` or `false`.
    Boolean,
    /// Any string, passed through unchanged.
    String,
}

impl PrimitiveKind {
    /// Human-readable name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
        }
    }

    /// Check whether a JSON value structurally matches this kind.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::String => value.is_string(),
        }
    }
}

// ============================================================================
// Object schema
// ============================================================================

/// A record of named fields, in declaration order.
///
/// Declaration order matters for [`Schema::Union`]: variants are tried in
/// order and the first match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<(String, Schema)>,
}

impl ObjectSchema {
    /// Create an object schema from `(name, schema)` pairs.
    pub fn new<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        }
    }

    /// Iterate over the declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, schema)| schema)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Return `true` if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a candidate value against this object schema.
    ///
    /// Every declared field is checked: a missing required field is an
    /// error, a missing `Default` field has its default materialized, and
    /// a missing `Optional` field is simply omitted. Keys not declared in
    /// the schema are ignored.
    pub fn validate(&self, value: &Value) -> Result<Map<String, Value>, Vec<ValidationError>> {
        self.validate_fields(value, false)
    }

    /// Validate a candidate value treating every field as optional.
    ///
    /// Missing fields are omitted (no error, no default); present fields
    /// are validated against their declared schema.
    pub fn validate_partial(
        &self,
        value: &Value,
    ) -> Result<Map<String, Value>, Vec<ValidationError>> {
        self.validate_fields(value, true)
    }

    fn validate_fields(
        &self,
        value: &Value,
        partial: bool,
    ) -> Result<Map<String, Value>, Vec<ValidationError>> {
        let Some(input) = value.as_object() else {
            return Err(vec![ValidationError::top_level("expected an object")]);
        };

        let mut out = Map::new();
        let mut errors = Vec::new();

        for (name, field_schema) in &self.fields {
            let present = input.get(name).filter(|v| !v.is_null());
            match present {
                Some(v) => match field_schema.validate(Some(v)) {
                    Ok(validated) => {
                        if !validated.is_null() {
                            out.insert(name.clone(), validated);
                        }
                    }
                    Err(errs) => errors.extend(errs.into_iter().map(|e| prefix_field(name, e))),
                },
                None if partial => {}
                None => match field_schema.validate(None) {
                    Ok(realized) => {
                        if !realized.is_null() {
                            out.insert(name.clone(), realized);
                        }
                    }
                    Err(_) => errors.push(ValidationError::new(name, "required")),
                },
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }
}

/// Re-root a nested error path under the enclosing field name.
fn prefix_field(name: &str, err: ValidationError) -> ValidationError {
    if err.field == "." {
        ValidationError::new(name, err.message)
    } else {
        ValidationError::new(format!("{name}.{}", err.field), err.message)
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Abstract description of an expected parameter shape.
///
/// See the [module docs](self) for the role of each variant, and
/// [`object`], [`union`], [`number`], [`boolean`], [`string`], [`array`]
/// for the builder functions.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// A record of named fields.
    Object(ObjectSchema),
    /// The wrapped schema may be absent.
    Optional(Box<Schema>),
    /// The wrapped schema falls back to `value` when absent.
    Default {
        /// The wrapped schema.
        inner: Box<Schema>,
        /// Value realized when the field is absent (or fails conversion).
        value: Value,
    },
    /// A union of record shapes, tried in declaration order.
    Union(Vec<ObjectSchema>),
    /// An array of scalar elements.
    Array(PrimitiveKind),
    /// A bare scalar.
    Primitive(PrimitiveKind),
}

impl Schema {
    /// Wrap this schema so the field may be absent.
    pub fn optional(self) -> Self {
        Self::Optional(Box::new(self))
    }

    /// Wrap this schema with a default value realized when absent.
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        Self::Default {
            inner: Box::new(self),
            value: value.into(),
        }
    }

    /// Strip exactly one outer [`Optional`](Self::Optional) layer, if any.
    ///
    /// Total function: any other schema is returned unchanged.
    pub fn unwrap_optional(&self) -> &Schema {
        match self {
            Self::Optional(inner) => inner,
            other => other,
        }
    }

    /// Strip exactly one outer [`Default`](Self::Default) *or*
    /// [`Optional`](Self::Optional) layer, if any.
    ///
    /// Used when deciding how to interpret a raw *value*, as opposed to
    /// deciding whether a default applies. Total function.
    pub fn unwrap_default_or_optional(&self) -> &Schema {
        match self {
            Self::Optional(inner) | Self::Default { inner, .. } => inner,
            other => other,
        }
    }

    /// Return `true` if this schema is wrapped in a [`Default`](Self::Default).
    pub fn has_default(&self) -> bool {
        matches!(self, Self::Default { .. })
    }

    /// Return `true` if a field of this schema must be present: neither
    /// `Optional`- nor `Default`-wrapped.
    pub fn is_required(&self) -> bool {
        !matches!(self, Self::Optional(_) | Self::Default { .. })
    }

    /// View this schema as an object, if it is one.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Variant name, used in panic and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Optional(_) => "optional",
            Self::Default { .. } => "default",
            Self::Union(_) => "union",
            Self::Array(_) => "array",
            Self::Primitive(kind) => kind.name(),
        }
    }

    /// Validate a candidate value against this schema.
    ///
    /// `None` stands for an absent value: an `Optional` accepts it (the
    /// result is `Value::Null`, meaning "omit"), a `Default` realizes its
    /// default value, and anything else reports `required`. This is the
    /// default-realization operation the codec and controller rely on.
    pub fn validate(&self, value: Option<&Value>) -> Result<Value, Vec<ValidationError>> {
        match (self, value) {
            (Self::Optional(_), None) => Ok(Value::Null),
            (Self::Optional(inner), Some(v)) => {
                if v.is_null() {
                    Ok(Value::Null)
                } else {
                    inner.validate(Some(v))
                }
            }
            (Self::Default { inner, value: default }, None) => inner.validate(Some(default)),
            (Self::Default { inner, value: default }, Some(v)) => {
                if v.is_null() {
                    inner.validate(Some(default))
                } else {
                    inner.validate(Some(v))
                }
            }
            (_, None) => Err(vec![ValidationError::top_level("required")]),
            (Self::Primitive(kind), Some(v)) => {
                if kind.matches(v) {
                    Ok(v.clone())
                } else {
                    Err(vec![ValidationError::top_level(format!(
                        "expected a {}",
                        kind.name()
                    ))])
                }
            }
            (Self::Array(kind), Some(v)) => match v.as_array() {
                Some(items) if items.iter().all(|item| kind.matches(item)) => Ok(v.clone()),
                Some(_) => Err(vec![ValidationError::top_level(format!(
                    "expected an array of {}s",
                    kind.name()
                ))]),
                None => Err(vec![ValidationError::top_level("expected an array")]),
            },
            (Self::Object(obj), Some(v)) => obj.validate(v).map(Value::Object),
            (Self::Union(variants), Some(v)) => {
                for variant in variants {
                    if let Ok(out) = variant.validate(v) {
                        return Ok(Value::Object(out));
                    }
                }
                Err(vec![ValidationError::top_level("no union variant matched")])
            }
        }
    }

    /// Validate a candidate value treating every field as optional.
    ///
    /// Supported on the same shapes as [`decode`](crate::codec::decode):
    /// objects (after stripping one outer `Optional`) and unions of
    /// objects, where the first variant accepting the value wins.
    ///
    /// # Panics
    ///
    /// Panics when called on any other schema shape; that is a caller bug.
    pub fn validate_partial(&self, value: &Value) -> Result<Value, Vec<ValidationError>> {
        match self.unwrap_optional() {
            Self::Object(obj) => obj.validate_partial(value).map(Value::Object),
            Self::Union(variants) => {
                for variant in variants {
                    if let Ok(out) = variant.validate_partial(value) {
                        return Ok(Value::Object(out));
                    }
                }
                Err(vec![ValidationError::top_level("no union variant matched")])
            }
            other => panic!(
                "validate_partial requires an object or union-of-objects schema, got {}",
                other.kind_name()
            ),
        }
    }
}

// ============================================================================
// Builder functions
// ============================================================================

/// Build an [`Schema::Object`] from `(name, schema)` pairs.
pub fn object<I, K>(fields: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    Schema::Object(ObjectSchema::new(fields))
}

/// Build a [`Schema::Union`] from object variants, tried in order.
pub fn union<I>(variants: I) -> Schema
where
    I: IntoIterator<Item = ObjectSchema>,
{
    Schema::Union(variants.into_iter().collect())
}

/// A `number` primitive schema.
pub fn number() -> Schema {
    Schema::Primitive(PrimitiveKind::Number)
}

/// A `boolean` primitive schema.
pub fn boolean() -> Schema {
    Schema::Primitive(PrimitiveKind::Boolean)
}

/// A `string` primitive schema.
pub fn string() -> Schema {
    Schema::Primitive(PrimitiveKind::String)
}

/// An array-of-scalar schema with the given element kind.
pub fn array(element: PrimitiveKind) -> Schema {
    Schema::Array(element)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_schema() -> Schema {
        object([
            ("page", number().default_value(1)),
            ("q", string().optional()),
            ("tags", array(PrimitiveKind::String).optional()),
        ])
    }

    #[test]
    fn test_unwrap_optional() {
        let schema = string().optional();
        assert_eq!(schema.unwrap_optional(), &string());

        // Only one layer is stripped, and non-optionals pass through.
        let double = string().optional().optional();
        assert_eq!(double.unwrap_optional(), &string().optional());
        assert_eq!(number().unwrap_optional(), &number());
    }

    #[test]
    fn test_unwrap_default_or_optional() {
        let schema = number().default_value(5);
        assert_eq!(schema.unwrap_default_or_optional(), &number());

        let schema = boolean().optional();
        assert_eq!(schema.unwrap_default_or_optional(), &boolean());

        assert_eq!(string().unwrap_default_or_optional(), &string());
    }

    #[test]
    fn test_is_required() {
        assert!(number().is_required());
        assert!(!number().optional().is_required());
        assert!(!number().default_value(1).is_required());
    }

    #[test]
    fn test_validate_primitives() {
        assert_eq!(number().validate(Some(&json!(3))), Ok(json!(3)));
        assert!(number().validate(Some(&json!("x"))).is_err());

        assert_eq!(boolean().validate(Some(&json!(true))), Ok(json!(true)));
        assert!(boolean().validate(Some(&json!(1))).is_err());

        assert_eq!(string().validate(Some(&json!("a"))), Ok(json!("a")));
        assert!(string().validate(Some(&json!(false))).is_err());
    }

    #[test]
    fn test_validate_array() {
        let schema = array(PrimitiveKind::Number);
        assert_eq!(schema.validate(Some(&json!([1, 2]))), Ok(json!([1, 2])));
        assert!(schema.validate(Some(&json!([1, "x"]))).is_err());
        assert!(schema.validate(Some(&json!("not-an-array"))).is_err());
    }

    #[test]
    fn test_validate_absent() {
        // Required primitives reject absence.
        assert!(number().validate(None).is_err());

        // Optional absence yields null (meaning "omit").
        assert_eq!(string().optional().validate(None), Ok(Value::Null));

        // Default absence realizes the default.
        assert_eq!(number().default_value(1).validate(None), Ok(json!(1)));
    }

    #[test]
    fn test_validate_object_realizes_defaults() {
        let schema = search_schema();

        let state = schema.validate(Some(&json!({}))).unwrap();
        assert_eq!(state, json!({ "page": 1 }));

        let state = schema
            .validate(Some(&json!({ "page": 3, "q": "rust" })))
            .unwrap();
        assert_eq!(state, json!({ "page": 3, "q": "rust" }));
    }

    #[test]
    fn test_validate_object_missing_required() {
        let schema = object([("id", number())]);
        let errs = schema.validate(Some(&json!({}))).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "id");
        assert_eq!(errs[0].message, "required");
    }

    #[test]
    fn test_validate_object_ignores_unknown_keys() {
        let schema = object([("page", number().default_value(1))]);
        let state = schema
            .validate(Some(&json!({ "page": 2, "junk": true })))
            .unwrap();
        assert_eq!(state, json!({ "page": 2 }));
    }

    #[test]
    fn test_validate_partial_skips_missing() {
        let schema = object([("id", number()), ("name", string())]);

        // Missing required fields are fine in partial mode.
        let state = schema.validate_partial(&json!({ "name": "a" })).unwrap();
        assert_eq!(state, json!({ "name": "a" }));

        // Present fields are still type-checked.
        assert!(schema.validate_partial(&json!({ "id": "oops" })).is_err());
    }

    #[test]
    fn test_validate_partial_no_default_realization() {
        let schema = search_schema();
        let state = schema.validate_partial(&json!({})).unwrap();
        assert_eq!(state, json!({}));
    }

    #[test]
    fn test_validate_union_first_match() {
        let schema = union([
            ObjectSchema::new([("a", number())]),
            ObjectSchema::new([("b", string())]),
        ]);

        assert_eq!(
            schema.validate(Some(&json!({ "a": 1 }))),
            Ok(json!({ "a": 1 }))
        );
        assert_eq!(
            schema.validate(Some(&json!({ "b": "x" }))),
            Ok(json!({ "b": "x" }))
        );
        assert!(schema.validate(Some(&json!({ "c": true }))).is_err());
    }

    #[test]
    fn test_nested_error_paths() {
        let schema = object([("filter", object([("min", number())]))]);
        let errs = schema
            .validate(Some(&json!({ "filter": { "min": "low" } })))
            .unwrap_err();
        assert_eq!(errs[0].field, "filter.min");
    }

    #[test]
    #[should_panic(expected = "validate_partial requires an object")]
    fn test_validate_partial_rejects_scalar_schema() {
        let _ = number().validate_partial(&json!(1));
    }
}
