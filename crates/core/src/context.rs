//! Per-render shared context.
//!
//! A [`PersonaContext`] is built fresh for every render pass (and for every action
//! resolution) and thrown away afterwards. It owns its filtered copy of the records, so a
//! mutation requested through [`RecordSink`] can never be observed half-applied by a widget;
//! the host re-renders with its updated collection instead.

use crate::filter::apply_filter;
use crate::persona::{PersonaConfig, PersonaIdentity};
use crate::record::Record;

/// Host-implemented mutation callback. This is the only path through which a record changes.
pub trait RecordSink {
    /// Replace the stored record with the same id by `record`, surfacing `message` if present.
    fn apply(&self, record: Record, message: Option<String>);
}

impl<F> RecordSink for F
where
    F: Fn(Record, Option<String>),
{
    fn apply(&self, record: Record, message: Option<String>) {
        self(record, message)
    }
}

/// Host-implemented selection-change callback.
pub trait SelectionSink {
    fn select(&self, record_id: &str);
}

impl<F> SelectionSink for F
where
    F: Fn(&str),
{
    fn select(&self, record_id: &str) {
        self(record_id)
    }
}

pub struct PersonaContext<'a> {
    /// Records visible to the persona, after the main filter.
    pub records: Vec<Record>,
    pub selected: Option<Record>,
    pub persona: PersonaIdentity,
    on_update: Option<&'a dyn RecordSink>,
    on_select: Option<&'a dyn SelectionSink>,
}

impl<'a> PersonaContext<'a> {
    /// Builds the context for `config`, applying its main filter to `records`.
    ///
    /// The selection is passed through as supplied; it is not required to be part of the
    /// filtered set.
    pub fn build(config: &PersonaConfig, records: &[Record], selected: Option<&Record>) -> Self {
        Self {
            records: apply_filter(config.filter.as_ref(), records),
            selected: selected.cloned(),
            persona: config.persona,
            on_update: None,
            on_select: None,
        }
    }

    pub fn with_update_sink(mut self, sink: &'a dyn RecordSink) -> Self {
        self.on_update = Some(sink);
        self
    }

    pub fn with_selection_sink(mut self, sink: &'a dyn SelectionSink) -> Self {
        self.on_select = Some(sink);
        self
    }

    pub fn can_update(&self) -> bool {
        self.on_update.is_some()
    }

    /// Forwards a replacement record to the host. Returns `false` when no sink is wired.
    pub fn update(&self, record: Record, message: Option<String>) -> bool {
        match self.on_update {
            Some(sink) => {
                sink.apply(record, message);
                true
            }
            None => false,
        }
    }

    /// Forwards a selection change to the host. Returns `false` when no sink is wired.
    pub fn select(&self, record_id: &str) -> bool {
        match self.on_select {
            Some(sink) => {
                sink.select(record_id);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for PersonaContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonaContext")
            .field("persona", &self.persona)
            .field("records", &self.records.len())
            .field("selected", &self.selected.as_ref().map(|r| r.id.as_str()))
            .field("on_update", &self.on_update.is_some())
            .field("on_select", &self.on_select.is_some())
            .finish()
    }
}
