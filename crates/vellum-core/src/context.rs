//! Context — where an audited action came from and who performed it.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Source ──────────────────────────────────────────────────────────────────

/// The kind of entry point an audited action originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSource {
  Console,
  Ui,
  Api,
  Webhook,
  Job,
  Unknown,
}

impl AuditSource {
  /// The stable string form stored with the record.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Console => "console",
      Self::Ui => "ui",
      Self::Api => "api",
      Self::Webhook => "webhook",
      Self::Job => "job",
      Self::Unknown => "unknown",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "console" => Some(Self::Console),
      "ui" => Some(Self::Ui),
      "api" => Some(Self::Api),
      "webhook" => Some(Self::Webhook),
      "job" => Some(Self::Job),
      "unknown" => Some(Self::Unknown),
      _ => None,
    }
  }
}

// ─── Actor identities ────────────────────────────────────────────────────────

/// An opaque user identifier handed over by the host's auth/session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ActorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ActorId {
  fn from(id: &str) -> Self {
    Self(id.to_owned())
  }
}

/// Who performed the action. An impersonator can only exist together with
/// the acting user, so the "impersonator implies actor" invariant is
/// unrepresentable rather than checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
  User(ActorId),
  Impersonated {
    /// The user the action was performed as.
    user: ActorId,
    /// The user actually at the keyboard.
    by:   ActorId,
  },
}

impl Actor {
  pub fn user_id(&self) -> &ActorId {
    match self {
      Self::User(id) | Self::Impersonated { user: id, .. } => id,
    }
  }

  pub fn impersonator_id(&self) -> Option<&ActorId> {
    match self {
      Self::User(_) => None,
      Self::Impersonated { by, .. } => Some(by),
    }
  }
}

// ─── IpAddress ───────────────────────────────────────────────────────────────

/// A validated originating IP address; IPv4 or IPv6, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress(IpAddr);

impl IpAddress {
  pub fn addr(self) -> IpAddr {
    self.0
  }
}

impl FromStr for IpAddress {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    s.parse::<IpAddr>()
      .map(Self)
      .map_err(|_| Error::InvalidIpAddress(s.to_owned()))
  }
}

impl From<IpAddr> for IpAddress {
  fn from(addr: IpAddr) -> Self {
    Self(addr)
  }
}

impl fmt::Display for IpAddress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// The immutable circumstances an audit event was recorded under.
///
/// Built through the named constructors only; each fixes the source tag and
/// takes whatever the entry point can provide. Console commands and jobs run
/// without a request, so they carry neither actor nor IP by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
  source: AuditSource,
  actor:  Option<Actor>,
  ip:     Option<IpAddress>,
}

impl Context {
  fn new(
    source: AuditSource,
    actor: Option<Actor>,
    ip: Option<IpAddress>,
  ) -> Self {
    Self { source, actor, ip }
  }

  pub fn console() -> Self {
    Self::new(AuditSource::Console, None, None)
  }

  pub fn job() -> Self {
    Self::new(AuditSource::Job, None, None)
  }

  pub fn ui(actor: Option<Actor>, ip: Option<IpAddress>) -> Self {
    Self::new(AuditSource::Ui, actor, ip)
  }

  pub fn api(actor: Option<Actor>, ip: Option<IpAddress>) -> Self {
    Self::new(AuditSource::Api, actor, ip)
  }

  /// Webhooks are generally unauthenticated, but custom authentication could
  /// be set up.
  pub fn webhook(actor: Option<Actor>, ip: Option<IpAddress>) -> Self {
    Self::new(AuditSource::Webhook, actor, ip)
  }

  /// There is no valid way to construct an unknown context. This panics to
  /// flag enum/constructor drift: whenever a variant is added to
  /// [`AuditSource`], a named constructor must be added here.
  pub fn unknown() -> Self {
    panic!(
      "unknown audit context; add new options to both AuditSource and Context"
    );
  }

  /// Rebuild a context from persisted fields. The source is trusted
  /// verbatim; the IP is re-validated; a stored impersonator without an
  /// actor is dropped.
  pub fn from_stored(
    source: AuditSource,
    actor: Option<ActorId>,
    impersonator: Option<ActorId>,
    ip: Option<&str>,
  ) -> Result<Self> {
    let actor = match (actor, impersonator) {
      (Some(user), Some(by)) => Some(Actor::Impersonated { user, by }),
      (Some(user), None) => Some(Actor::User(user)),
      (None, _) => None,
    };
    let ip = ip.map(IpAddress::from_str).transpose()?;
    Ok(Self::new(source, actor, ip))
  }

  pub fn source(&self) -> AuditSource {
    self.source
  }

  pub fn actor(&self) -> Option<&Actor> {
    self.actor.as_ref()
  }

  pub fn actor_id(&self) -> Option<&ActorId> {
    self.actor.as_ref().map(Actor::user_id)
  }

  pub fn impersonator_id(&self) -> Option<&ActorId> {
    self.actor.as_ref().and_then(Actor::impersonator_id)
  }

  pub fn ip(&self) -> Option<IpAddress> {
    self.ip
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
