//! Presenter — paginated retrieval and re-hydration of stored events.

use thiserror::Error;

use crate::{
  event::{AuditEvent, EventRegistry},
  store::{AuditStore, EventQuery, StoredEvent},
};

/// An error surfaced while fetching: either the backend failed, or a record
/// could not be re-hydrated.
#[derive(Debug, Error)]
pub enum PresenterError<E: std::error::Error> {
  #[error("store error: {0}")]
  Store(#[source] E),

  #[error(transparent)]
  Core(#[from] crate::Error),
}

/// Fetches stored records and dispatches them to their registered event
/// types.
pub struct Presenter<S> {
  store:    S,
  registry: EventRegistry,
}

impl<S: AuditStore> Presenter<S> {
  pub const DEFAULT_PAGE_SIZE: u32 = 50;

  pub fn new(store: S, registry: EventRegistry) -> Self {
    Self { store, registry }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// Flatten and persist one event.
  pub async fn append(
    &self,
    event: &dyn AuditEvent,
  ) -> Result<(), PresenterError<S::Error>> {
    self
      .store
      .append(StoredEvent::from_event(event))
      .await
      .map_err(PresenterError::Store)
  }

  /// Fetch one page of events matching `criteria`, newest first.
  ///
  /// `page = None` fetches everything; a page below 1 is clamped to page 1.
  /// Records are re-hydrated lazily as the returned sequence is consumed, so
  /// an unknown action tag surfaces mid-iteration rather than up front.
  /// The sequence is restartable by calling `fetch` again, not by resuming.
  pub async fn fetch(
    &self,
    criteria: EventQuery,
    page: Option<u32>,
    page_size: u32,
  ) -> Result<
    impl Iterator<Item = crate::Result<Box<dyn AuditEvent>>> + '_,
    PresenterError<S::Error>,
  > {
    let mut query = criteria;
    match page {
      Some(page) => {
        let page = page.max(1);
        query.limit = Some(page_size);
        query.offset = Some((page - 1) * page_size);
      }
      None => {
        query.limit = None;
        query.offset = None;
      }
    }

    let records = self
      .store
      .fetch(&query)
      .await
      .map_err(PresenterError::Store)?;

    Ok(
      records
        .into_iter()
        .map(|record| self.registry.rehydrate(record)),
    )
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
