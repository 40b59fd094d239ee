//! Subject-identity resolution.
//!
//! Given an arbitrary domain object, the resolver derives a stable,
//! serializable identifier for it without a priori knowledge of its shape.
//! Domain types opt in through the [`AuditSubject`] trait, a small
//! capability-detection surface standing in for the runtime reflection the
//! concept originates from. Resolution is an ordered fallback chain; the
//! first source that yields a value wins and later sources are never
//! consulted.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Error, Result};

// ─── Declared types ──────────────────────────────────────────────────────────

/// The declared type of a domain object, before proxy unwinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
  /// A named, instantiable type.
  Concrete(String),
  /// An anonymous or synthetic type (closures, generated types). Never
  /// auditable.
  Anonymous,
  /// A lazy persistence proxy standing in for a real type. `None` means the
  /// proxy cannot name what it stands in for.
  Proxy(Option<Box<DeclaredType>>),
}

impl DeclaredType {
  /// Derive a declared type from a Rust type, stripping module paths.
  /// Closure types have no stable name and map to [`DeclaredType::Anonymous`].
  pub fn of<T: ?Sized>() -> Self {
    let full = std::any::type_name::<T>();
    if full.contains("{{closure}}") {
      return Self::Anonymous;
    }
    Self::Concrete(strip_module_path(full))
  }
}

/// Drop module paths from a `std::any::type_name` string, keeping generic
/// structure intact (`a::b::Vec<c::String>` becomes `Vec<String>`).
fn strip_module_path(full: &str) -> String {
  let mut out = String::with_capacity(full.len());
  let mut segment = String::new();
  for ch in full.chars() {
    match ch {
      ':' => segment.clear(),
      '<' | '>' | '(' | ')' | '[' | ']' | ',' | ' ' | '&' | ';' => {
        out.push_str(&segment);
        segment.clear();
        out.push(ch);
      }
      _ => segment.push(ch),
    }
  }
  out.push_str(&segment);
  out
}

// ─── Identifier values ───────────────────────────────────────────────────────

/// A single identity-bearing value read off a domain object.
///
/// The variants mirror what the identifier codec can canonicalise: plain
/// scalars, objects with a custom string form, objects with structured
/// self-serialization, and everything else ([`IdValue::Opaque`], which the
/// codec rejects with the runtime type name for diagnostics).
#[derive(Debug, Clone, PartialEq)]
pub enum IdValue {
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
  /// An object with a custom string-conversion capability, already rendered.
  Stringable(String),
  /// An object exposing a structured self-serialization.
  Structured(serde_json::Value),
  /// An object with neither capability; carries its runtime type name.
  Opaque(String),
}

impl IdValue {
  /// Human-readable name of the value's runtime type, for error reporting.
  pub fn type_name(&self) -> &str {
    match self {
      Self::Bool(_) => "bool",
      Self::Int(_) => "integer",
      Self::Float(_) => "float",
      Self::Text(_) => "string",
      Self::Stringable(_) => "stringable",
      Self::Structured(_) => "structured",
      Self::Opaque(name) => name,
    }
  }
}

/// The outcome of identity resolution; consumed by the codec, never stored.
///
/// Composite identities are keyed by field name in a `BTreeMap`, so the
/// lexicographic ordering required for deterministic encoding is structural.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedIdentifier {
  /// The object is identity-less.
  None,
  /// A single identifier value.
  Scalar(IdValue),
  /// Multiple identifier fields, ordered lexicographically by name.
  Composite(BTreeMap<String, IdValue>),
}

// ─── Subject capabilities ────────────────────────────────────────────────────

/// An explicitly declared identity-bearing field. A field may be declared but
/// not yet assigned a value; the resolver treats that as absent.
#[derive(Debug, Clone)]
pub struct IdentityField {
  pub name:  String,
  pub value: Option<IdValue>,
}

impl IdentityField {
  pub fn new(name: impl Into<String>, value: IdValue) -> Self {
    Self { name: name.into(), value: Some(value) }
  }

  /// A field that is declared but has no value assigned yet.
  pub fn unassigned(name: impl Into<String>) -> Self {
    Self { name: name.into(), value: None }
  }
}

/// A conventionally-named identity accessor, as declared by the subject type.
pub enum IdentityAccessor<'a> {
  /// A zero-argument accessor; invoked during resolution.
  Nullary(Box<dyn FnOnce() -> Option<IdValue> + 'a>),
  /// An accessor that requires arguments; treated as not found, never called.
  Parameterized,
}

/// The capability surface a domain type exposes so the resolver can inspect
/// it. Every method except [`AuditSubject::declared_type`] defaults to "not
/// present", which makes the corresponding chain step fall through.
pub trait AuditSubject {
  /// The object's declared type, before any proxy unwinding.
  fn declared_type(&self) -> DeclaredType;

  /// Explicit identity markers, if the type declares any.
  fn identity_fields(&self) -> Vec<IdentityField> {
    Vec::new()
  }

  /// The conventional `id` field, when present and populated.
  fn id_field(&self) -> Option<IdValue> {
    None
  }

  /// The conventional identity accessor, when the type declares one.
  fn identity_accessor(&self) -> Option<IdentityAccessor<'_>> {
    None
  }
}

// ─── Persistence registry ────────────────────────────────────────────────────

/// The persistence layer's view of managed types.
///
/// A failed lookup is "not found", never an error: the resolver falls through
/// to the next chain step. The registry is an explicit, optional dependency
/// of [`SubjectResolver`]; when absent, step 1 of the chain is a guaranteed
/// fallthrough.
pub trait IdentityRegistry: Send + Sync {
  /// Identifier field names and values for a managed object, or `None` when
  /// the object's type is not managed by this registry.
  fn identifier_values(
    &self,
    subject: &dyn AuditSubject,
  ) -> Option<BTreeMap<String, IdValue>>;

  /// Map a declared (possibly proxy) type to the managed entity type it
  /// stands in for.
  fn managed_type(&self, declared: &DeclaredType) -> Option<String>;
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Resolves a domain object's concrete type name and identifier.
///
/// Reads only; no observable side effects.
#[derive(Clone, Default)]
pub struct SubjectResolver {
  registry: Option<Arc<dyn IdentityRegistry>>,
}

impl SubjectResolver {
  /// A resolver without a persistence registry.
  pub fn new() -> Self {
    Self { registry: None }
  }

  pub fn with_registry(registry: Arc<dyn IdentityRegistry>) -> Self {
    Self { registry: Some(registry) }
  }

  /// The concrete type name of `subject`, with persistence proxies unwound.
  ///
  /// The registry is consulted first; when it cannot map the declared type,
  /// the proxy chain is walked manually. Fails with
  /// [`Error::SubjectNotConcrete`] on anonymous types and on proxy chains
  /// that terminate without resolving.
  pub fn subject_type(&self, subject: &dyn AuditSubject) -> Result<String> {
    let declared = subject.declared_type();

    if let Some(registry) = &self.registry
      && let Some(name) = registry.managed_type(&declared)
    {
      return Ok(name);
    }

    let mut current = declared;
    loop {
      match current {
        DeclaredType::Concrete(name) => return Ok(name),
        DeclaredType::Anonymous => return Err(Error::SubjectNotConcrete),
        DeclaredType::Proxy(Some(inner)) => current = *inner,
        DeclaredType::Proxy(None) => return Err(Error::SubjectNotConcrete),
      }
    }
  }

  /// Run the fallback chain: managed identity, declared identity markers,
  /// conventional `id` field, conventional zero-argument accessor, then
  /// [`ResolvedIdentifier::None`]. First success wins; sources are never
  /// combined.
  pub fn resolve(&self, subject: &dyn AuditSubject) -> ResolvedIdentifier {
    self
      .managed_identifier(subject)
      .or_else(|| declared_identifier(subject))
      .or_else(|| subject.id_field().map(ResolvedIdentifier::Scalar))
      .or_else(|| accessor_identifier(subject))
      .unwrap_or(ResolvedIdentifier::None)
  }

  fn managed_identifier(
    &self,
    subject: &dyn AuditSubject,
  ) -> Option<ResolvedIdentifier> {
    let values = self.registry.as_ref()?.identifier_values(subject)?;
    from_field_map(values)
  }
}

/// Collapse a map of identifier fields into a resolved identifier, applying
/// the single-vs-multiple-field rule. An empty map is "not found".
fn from_field_map(
  mut values: BTreeMap<String, IdValue>,
) -> Option<ResolvedIdentifier> {
  match values.len() {
    0 => None,
    1 => {
      let key = values.keys().next()?.clone();
      values.remove(&key).map(ResolvedIdentifier::Scalar)
    }
    _ => Some(ResolvedIdentifier::Composite(values)),
  }
}

fn declared_identifier(subject: &dyn AuditSubject) -> Option<ResolvedIdentifier> {
  let fields = subject.identity_fields();
  match fields.len() {
    0 => None,
    1 => {
      let field = fields.into_iter().next()?;
      // Declared but unassigned is absent, not an error.
      field.value.map(ResolvedIdentifier::Scalar)
    }
    _ => {
      if fields.iter().any(|field| field.value.is_none()) {
        return None;
      }
      let map = fields
        .into_iter()
        .filter_map(|field| field.value.map(|value| (field.name, value)))
        .collect();
      Some(ResolvedIdentifier::Composite(map))
    }
  }
}

fn accessor_identifier(subject: &dyn AuditSubject) -> Option<ResolvedIdentifier> {
  match subject.identity_accessor()? {
    IdentityAccessor::Nullary(accessor) => Some(
      accessor()
        .map(ResolvedIdentifier::Scalar)
        .unwrap_or(ResolvedIdentifier::None),
    ),
    // Requires arguments: treated as not found, never invoked.
    IdentityAccessor::Parameterized => None,
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
