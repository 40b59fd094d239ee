//! Subject — the frozen type-name/identifier pair an audit event points at.
//!
//! A subject is resolved once, at event construction time, and never
//! re-resolved; storage carries the frozen value.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  codec::identifier_to_string,
  identity::{AuditSubject, SubjectResolver},
};

/// An immutable reference to the domain object an audit event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  type_name:  String,
  identifier: Option<String>,
}

impl Subject {
  /// Resolve a live domain object into a subject. Null in, null out.
  ///
  /// This is the single integration point of the identity resolver and the
  /// identifier codec; subjects are never hand-built from arbitrary strings.
  pub fn from_object(
    resolver: &SubjectResolver,
    subject: Option<&dyn AuditSubject>,
  ) -> Result<Option<Self>> {
    let Some(subject) = subject else {
      return Ok(None);
    };
    let type_name = resolver.subject_type(subject)?;
    let identifier = identifier_to_string(&resolver.resolve(subject))?;
    Ok(Some(Self { type_name, identifier }))
  }

  /// Rebuild a subject from a previously stored flattened pair. The stored
  /// values are trusted verbatim; no resolution or encoding happens here.
  pub fn from_stored(
    type_name: impl Into<String>,
    identifier: Option<String>,
  ) -> Self {
    Self { type_name: type_name.into(), identifier }
  }

  /// Stable name of the subject's concrete type.
  pub fn type_name(&self) -> &str {
    &self.type_name
  }

  /// Canonical string form of the subject's identifier, or `None` for
  /// identity-less subjects.
  pub fn identifier(&self) -> Option<&str> {
    self.identifier.as_deref()
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
