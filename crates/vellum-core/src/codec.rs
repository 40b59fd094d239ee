//! Canonical string encoding for resolved identifiers.
//!
//! The codec is storage-bound and one-directional: a stored identifier string
//! is treated as opaque on re-hydration, and only byte-for-byte equality with
//! a freshly encoded value is guaranteed. Composite identifiers encode as
//! canonical JSON with lexicographic key order (carried over structurally
//! from the resolver's `BTreeMap`), forward slashes left unescaped, and
//! integral floats keeping their fractional marker (`1.0`, not `1`).

use serde_json::{Map, Number, Value};

use crate::{
  Error, Result,
  identity::{IdValue, ResolvedIdentifier},
};

/// Encode a resolved identifier into its canonical string form, or `None`
/// for identity-less subjects.
pub fn identifier_to_string(
  identifier: &ResolvedIdentifier,
) -> Result<Option<String>> {
  match identifier {
    ResolvedIdentifier::None => Ok(None),
    ResolvedIdentifier::Scalar(value) => scalar_to_string(value).map(Some),
    ResolvedIdentifier::Composite(fields) => {
      let mut object = Map::new();
      for (name, value) in fields {
        object.insert(name.clone(), to_json_value(value)?);
      }
      Ok(Some(Value::Object(object).to_string()))
    }
  }
}

fn scalar_to_string(value: &IdValue) -> Result<String> {
  match value {
    // Boolean literals, not the numeric form.
    IdValue::Bool(b) => Ok(if *b { "true" } else { "false" }.to_owned()),
    IdValue::Int(i) => Ok(i.to_string()),
    IdValue::Float(f) => Ok(float_to_json(*f, value)?.to_string()),
    IdValue::Text(s) | IdValue::Stringable(s) => Ok(s.clone()),
    IdValue::Structured(json) => Ok(json.to_string()),
    IdValue::Opaque(type_name) => {
      Err(Error::IdentifierConversion { type_name: type_name.clone() })
    }
  }
}

fn to_json_value(value: &IdValue) -> Result<Value> {
  match value {
    IdValue::Bool(b) => Ok(Value::Bool(*b)),
    IdValue::Int(i) => Ok(Value::Number(Number::from(*i))),
    IdValue::Float(f) => float_to_json(*f, value).map(Value::Number),
    IdValue::Text(s) | IdValue::Stringable(s) => {
      Ok(Value::String(s.clone()))
    }
    IdValue::Structured(json) => Ok(json.clone()),
    IdValue::Opaque(type_name) => {
      Err(Error::IdentifierConversion { type_name: type_name.clone() })
    }
  }
}

/// `serde_json::Number` prints `1.0` as `1.0` (zero fractions preserved).
/// Non-finite floats have no JSON form and fail as a conversion error.
fn float_to_json(f: f64, value: &IdValue) -> Result<Number> {
  Number::from_f64(f).ok_or_else(|| Error::IdentifierConversion {
    type_name: value.type_name().to_owned(),
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
