//! Schema-directed codec between raw query parameters and typed state.
//!
//! [`decode`] turns a [`QueryParams`] bag into a [`TypedState`] record
//! under the direction of a [`Schema`], and [`encode`] is its near-inverse:
//! it serializes a record back into a bag while *eliding* every value the
//! schema would reconstruct anyway (defaults), so the URL carries no noise.
//!
//! The decode posture is best-effort, never-throw: a raw value that cannot
//! become its declared type drops the field (or substitutes its default),
//! and a union with no matching variant decodes to an empty record. The
//! only hard failures are caller bugs — decoding against a schema that is
//! not an object or a union of objects.
//!
//! # Example
//!
//! ```
//! use query_state::codec::{decode, encode};
//! use query_state::schema::{array, number, object, PrimitiveKind};
//! use query_state::QueryParams;
//! use serde_json::json;
//!
//! let schema = object([
//!     ("page", number().default_value(1)),
//!     ("tags", array(PrimitiveKind::String).optional()),
//! ]);
//!
//! let bag = QueryParams::from_query_string("tags=x&tags=y");
//! let state = decode(&schema, &bag);
//! assert_eq!(serde_json::Value::Object(state.clone()), json!({ "page": 1, "tags": ["x", "y"] }));
//!
//! // `page` equals its default, so the encoded bag elides it.
//! let bag = encode(schema.as_object().unwrap(), &state, None);
//! assert_eq!(bag.to_query_string(), "tags=x&tags=y");
//! ```

use crate::debug_log;
use crate::error::ParamError;
use crate::params::QueryParams;
use crate::schema::{ObjectSchema, PrimitiveKind, Schema};
use serde_json::{Map, Value};

/// The validated, schema-conformant record callers work with.
///
/// A field absent from the query string and without a default is *omitted*
/// from the map, never set to `Value::Null`.
pub type TypedState = Map<String, Value>;

// ============================================================================
// Decode
// ============================================================================

/// Decode a raw param bag into typed state under a schema's direction.
///
/// The schema may carry one outer [`Schema::Optional`] layer; underneath
/// it must be an object or a union of objects. Union variants are tried in
/// declaration order: a variant is rejected as soon as any of its fields
/// fails to parse, and a decoded variant only wins if every one of its
/// required fields is present. When no variant matches, the result is an
/// empty record, not an error.
///
/// # Panics
///
/// Panics when the (unwrapped) schema is anything other than an object or
/// a union of objects. That is a programming error, not bad input.
pub fn decode(schema: &Schema, bag: &QueryParams) -> TypedState {
    match schema.unwrap_optional() {
        Schema::Object(obj) => decode_object(obj, bag),
        Schema::Union(variants) => {
            for variant in variants {
                if let Ok(state) = try_decode_object(variant, bag) {
                    if required_fields_present(variant, &state) {
                        return state;
                    }
                }
            }
            debug_log!("no union variant matched the query parameters");
            TypedState::new()
        }
        other => panic!(
            "decode requires an object or union-of-objects schema, got {}",
            other.kind_name()
        ),
    }
}

/// Decode every declared field, dropping the ones that fail.
pub(crate) fn decode_object(obj: &ObjectSchema, bag: &QueryParams) -> TypedState {
    let mut out = TypedState::new();

    for (name, field_schema) in obj.fields() {
        match decode_field(name, field_schema, bag) {
            Ok(Some(value)) => {
                out.insert(name.to_string(), value);
            }
            Ok(None) => {}
            Err(err) => {
                // Recoverable: the field is omitted from the result.
                debug_log!("dropping query field '{}': {}", name, err);
            }
        }
    }

    out
}

/// Tentative decode for a union variant: the first field error rejects
/// the whole variant (unless the field's default swallowed it).
fn try_decode_object(obj: &ObjectSchema, bag: &QueryParams) -> Result<TypedState, ParamError> {
    let mut out = TypedState::new();

    for (name, field_schema) in obj.fields() {
        if let Some(value) = decode_field(name, field_schema, bag)? {
            out.insert(name.to_string(), value);
        }
    }

    Ok(out)
}

fn required_fields_present(obj: &ObjectSchema, state: &TypedState) -> bool {
    obj.fields()
        .all(|(name, schema)| !schema.is_required() || state.contains_key(name))
}

/// Decode a single field from its raw values.
///
/// `Ok(None)` means the field is omitted. A `Default`-wrapped field never
/// returns `Err`: conversion failures are swallowed and the default
/// applies, exactly as if the field were absent.
fn decode_field(
    name: &str,
    schema: &Schema,
    bag: &QueryParams,
) -> Result<Option<Value>, ParamError> {
    match bag.get_all(name) {
        Some(raws) => match convert_raws(name, raws, schema) {
            Ok(value) => Ok(Some(value)),
            Err(err) if schema.has_default() => {
                debug_log!("field '{}' falls back to its default: {}", name, err);
                Ok(realize_default(schema))
            }
            Err(err) => Err(err),
        },
        None if schema.has_default() => Ok(realize_default(schema)),
        None => Ok(None),
    }
}

/// Realize a `Default`-wrapped field's default value (`None` when the
/// default itself validates to null).
fn realize_default(schema: &Schema) -> Option<Value> {
    schema.validate(None).ok().filter(|v| !v.is_null())
}

/// Convert raw strings into a typed value and re-validate it against the
/// original (still wrapped) field schema.
fn convert_raws(name: &str, raws: &[String], schema: &Schema) -> Result<Value, ParamError> {
    let shape = schema.unwrap_default_or_optional();

    if raws.len() > 1 && !matches!(shape, Schema::Array(_)) {
        return Err(ParamError::multiplicity(name, raws.len()));
    }

    let converted = match shape {
        Schema::Array(kind) => {
            let elements = raws
                .iter()
                .map(|raw| convert_scalar(name, raw, *kind))
                .collect::<Result<Vec<Value>, ParamError>>()?;
            Value::Array(elements)
        }
        Schema::Primitive(kind) => convert_scalar(name, &raws[0], *kind)?,
        // A raw string cannot become an object/union/nested shape.
        other => return Err(ParamError::convert(name, other.kind_name(), raws[0].clone())),
    };

    schema
        .validate(Some(&converted))
        .map_err(|_| ParamError::validation(name))
}

fn convert_scalar(field: &str, raw: &str, kind: PrimitiveKind) -> Result<Value, ParamError> {
    match kind {
        PrimitiveKind::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(canonical_number)
            .ok_or_else(|| ParamError::convert(field, "number", raw)),
        PrimitiveKind::Boolean => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(ParamError::convert(field, "boolean", raw)),
        },
        PrimitiveKind::String => Ok(Value::String(raw.to_string())),
    }
}

/// Keep integral floats as integer numbers so decoded state compares
/// structurally equal to builder-supplied defaults and partials.
fn canonical_number(f: f64) -> Value {
    if f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&f) {
        Value::from(f as i64)
    } else {
        Value::from(f)
    }
}

/// Apply [`canonical_number`] through a value, recursing into arrays.
/// `serde_json` treats `1` and `1.0` as unequal; both sides of a
/// default-elision comparison must use the same representation.
fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => {
            n.as_f64().map_or_else(|| value.clone(), canonical_number)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        _ => value.clone(),
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Encode typed state back into a raw param bag, eliding defaults.
///
/// `partial`, when given, overrides `full` key-by-key before encoding.
/// `Null` values and values equal to their schema default are skipped;
/// arrays emit one entry per non-null element in order; structured values
/// that are not part of the schema model travel as opaque JSON blobs.
/// Caller-supplied numbers are canonicalized first, so an integral float
/// such as `1.0` elides against a default of `1` and renders as `1`.
///
/// Encode operates on a single object schema only — a controller built
/// over a union must select the concrete variant before calling this.
pub fn encode(
    schema: &ObjectSchema,
    full: &TypedState,
    partial: Option<&TypedState>,
) -> QueryParams {
    let mut merged = full.clone();
    if let Some(partial) = partial {
        for (key, value) in partial {
            merged.insert(key.clone(), value.clone());
        }
    }

    // Decoding an empty bag realizes every default; those are the values
    // the URL never needs to carry.
    let defaults = decode_object(schema, &QueryParams::new());

    let mut bag = QueryParams::new();
    for (key, value) in &merged {
        if value.is_null() {
            continue;
        }
        let value = canonical_value(value);
        if defaults.get(key) == Some(&value) {
            continue;
        }

        match &value {
            Value::Array(items) => {
                for item in items {
                    if !item.is_null() {
                        bag.append(key, scalar_string(item));
                    }
                }
            }
            Value::Object(_) => {
                if let Ok(blob) = serde_json::to_string(&value) {
                    bag.append(key, blob);
                }
            }
            _ => bag.append(key, scalar_string(&value)),
        }
    }

    bag
}

/// String form of a scalar value: strings unquoted, everything else via
/// its JSON rendering.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
