//! Rendering — from an audit event to translation keys and parameters.
//!
//! The core produces keys and parameter maps only; the actual string lookup
//! lives in the host's translation layer. Keys are dotted and namespaced,
//! parameters are wrapped in `%…%` markers, and namespacing is idempotent so
//! repeated rendering never double-prefixes.

use std::collections::BTreeMap;

use crate::event::{AuditEvent, InfoEntry};

/// Translation domain all audit messages live under.
pub const TRANSLATION_DOMAIN: &str = "audit";
/// Namespace for primary action messages.
pub const NAMESPACE_ACTION: &str = "audit.action";
/// Namespace for additional-info entries.
pub const NAMESPACE_EXTRA: &str = "audit.extra";
/// Namespace for context source labels.
pub const NAMESPACE_CONTEXT: &str = "audit.context";

/// Prefix `message` with the dotted namespace built from `parts`, unless it
/// already starts with that exact namespace string.
pub fn in_namespace(message: &str, parts: &[&str]) -> String {
  let namespace = parts
    .iter()
    .map(|part| part.trim_matches('.'))
    .collect::<Vec<_>>()
    .join(".");
  let message = message.trim_start_matches('.');
  if message.starts_with(&namespace) {
    message.to_owned()
  } else {
    format!("{namespace}.{message}")
  }
}

/// Wrap parameter keys in `%…%` markers for the translation layer. Keys that
/// already carry markers are not doubled.
pub fn prepare_parameters(
  parameters: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
  parameters
    .iter()
    .map(|(key, value)| {
      (format!("%{}%", key.trim_matches('%')), value.clone())
    })
    .collect()
}

// ─── Rendered output ─────────────────────────────────────────────────────────

/// A fully-namespaced translation key with prepared parameters, ready to be
/// handed to the host's translation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSpec {
  pub key:        String,
  pub parameters: BTreeMap<String, String>,
  pub domain:     &'static str,
}

/// One auxiliary info line: either literal display text or a translatable
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoLine {
  Literal(String),
  Message(MessageSpec),
}

/// Everything the host needs to display one audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEvent {
  /// The primary action message.
  pub message: MessageSpec,
  /// The label for the event's source kind.
  pub source:  MessageSpec,
  /// Auxiliary info lines, in declaration order.
  pub info:    Vec<InfoLine>,
}

/// Render an event into translation keys and parameters.
///
/// Keyed info entries are namespaced under the extra-info namespace plus the
/// event's own message key, so `button => {name}` on a `widget.created`
/// event renders under `audit.extra.widget.created.button`.
pub fn render(event: &dyn AuditEvent) -> RenderedEvent {
  let message_key = event.message().to_owned();

  let message = MessageSpec {
    key:        in_namespace(&message_key, &[NAMESPACE_ACTION]),
    parameters: prepare_parameters(&event.parameters()),
    domain:     TRANSLATION_DOMAIN,
  };

  let source = MessageSpec {
    key:        in_namespace(
      event.body().context().source().as_str(),
      &[NAMESPACE_CONTEXT],
    ),
    parameters: BTreeMap::new(),
    domain:     TRANSLATION_DOMAIN,
  };

  let info = event
    .info()
    .into_iter()
    .map(|entry| match entry {
      InfoEntry::Literal(text) => InfoLine::Literal(text),
      InfoEntry::Keyed { key, parameters } => InfoLine::Message(MessageSpec {
        key:        in_namespace(&key, &[NAMESPACE_EXTRA, message_key.as_str()]),
        parameters: prepare_parameters(&parameters),
        domain:     TRANSLATION_DOMAIN,
      }),
    })
    .collect();

  RenderedEvent { message, source, info }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::{
    InfoLine, NAMESPACE_ACTION, in_namespace, prepare_parameters, render,
  };
  use crate::{
    context::Context,
    event::{AuditEvent, EventBody, EventData, InfoEntry},
  };

  #[test]
  fn namespacing_prefixes_once() {
    let once = in_namespace("widget.created", &[NAMESPACE_ACTION]);
    assert_eq!(once, "audit.action.widget.created");

    // Idempotent: namespacing an already-namespaced key is a no-op.
    assert_eq!(in_namespace(&once, &[NAMESPACE_ACTION]), once);
  }

  #[test]
  fn namespacing_joins_parts_and_trims_dots() {
    assert_eq!(
      in_namespace(".button", &["audit.extra.", "widget.created"]),
      "audit.extra.widget.created.button"
    );
  }

  #[test]
  fn parameter_keys_are_wrapped_once() {
    let prepared = prepare_parameters(&BTreeMap::from([
      ("name".to_owned(), "Red".to_owned()),
      ("%kind%".to_owned(), "widget".to_owned()),
    ]));
    assert_eq!(prepared.get("%name%").map(String::as_str), Some("Red"));
    assert_eq!(prepared.get("%kind%").map(String::as_str), Some("widget"));
  }

  #[derive(Debug)]
  struct ButtonPressed {
    body: EventBody,
  }

  impl AuditEvent for ButtonPressed {
    fn action(&self) -> &'static str {
      "button_pressed"
    }

    fn message(&self) -> &str {
      "button.pressed"
    }

    fn parameters(&self) -> BTreeMap<String, String> {
      BTreeMap::from([("name".to_owned(), "Red".to_owned())])
    }

    fn info(&self) -> Vec<InfoEntry> {
      vec![
        InfoEntry::Keyed {
          key:        "button".to_owned(),
          parameters: BTreeMap::from([(
            "name".to_owned(),
            "Red".to_owned(),
          )]),
        },
        InfoEntry::Literal("pressed twice".to_owned()),
      ]
    }

    fn body(&self) -> &EventBody {
      &self.body
    }
  }

  #[test]
  fn render_composes_message_source_and_info() {
    let event = ButtonPressed {
      body: EventBody::new(Context::console(), None, EventData::new()),
    };
    let rendered = render(&event);

    assert_eq!(rendered.message.key, "audit.action.button.pressed");
    assert_eq!(
      rendered.message.parameters.get("%name%").map(String::as_str),
      Some("Red")
    );
    assert_eq!(rendered.source.key, "audit.context.console");

    assert_eq!(rendered.info.len(), 2);
    match &rendered.info[0] {
      InfoLine::Message(spec) => {
        assert_eq!(spec.key, "audit.extra.button.pressed.button");
        assert_eq!(
          spec.parameters.get("%name%").map(String::as_str),
          Some("Red")
        );
      }
      other => panic!("expected keyed info line, got {other:?}"),
    }
    assert_eq!(
      rendered.info[1],
      InfoLine::Literal("pressed twice".to_owned())
    );
  }
}
