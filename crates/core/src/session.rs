//! Host-side session state.
//!
//! A [`Session`] owns what the engine deliberately does not: the record collection, the
//! current selection, analysis widget state and a bounded log of notifications. It plays
//! the host's part of the contract, implementing the mutation callback (merge by id,
//! refresh `lastUpdated`, surface the message) and the selection callback.

use crate::actions::{select_row, trigger_action, ActionResolution, ActionTrigger};
use crate::analysis::{AnalysisBoard, AnalysisError, AnalysisResult, AnalysisTicket};
use crate::constants::NOTIFICATION_LOG_CAPACITY;
use crate::context::PersonaContext;
use crate::layout::{render_dashboard, render_sidebar, DashboardView, SidebarView};
use crate::persona::PersonaConfig;
use crate::record::Record;
use crate::widgets::WidgetKind;
use crate::{DashboardError, DashboardResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub record_id: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Session {
    records: Vec<Record>,
    selected_id: Option<String>,
    analysis: AnalysisBoard,
    notifications: VecDeque<Notification>,
}

impl Session {
    /// Start a session over `records`, selecting the first one.
    pub fn new(records: Vec<Record>) -> Self {
        let selected_id = records.first().map(|r| r.id.clone());
        let mut analysis = AnalysisBoard::default();
        analysis.select(selected_id.as_deref());
        Self {
            records,
            selected_id,
            analysis,
            notifications: VecDeque::with_capacity(NOTIFICATION_LOG_CAPACITY),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// The selected record, falling back to the first record when the selected id is gone.
    pub fn selected(&self) -> Option<&Record> {
        self.selected_id
            .as_deref()
            .and_then(|id| self.records.iter().find(|r| r.id == id))
            .or_else(|| self.records.first())
    }

    /// Selection callback. Changing the selection invalidates analysis state.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UnknownRecord`] if no record has `record_id`.
    pub fn select(&mut self, record_id: &str) -> DashboardResult<()> {
        if !self.records.iter().any(|r| r.id == record_id) {
            return Err(DashboardError::UnknownRecord(record_id.to_string()));
        }
        self.selected_id = Some(record_id.to_string());
        self.analysis.select(Some(record_id));
        tracing::debug!("selected record {}", record_id);
        Ok(())
    }

    pub fn analysis(&self) -> &AnalysisBoard {
        &self.analysis
    }

    /// Notifications, most recent first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().rev()
    }

    pub fn render(&self, config: &PersonaConfig) -> DashboardView {
        let ctx = PersonaContext::build(config, &self.records, self.selected());
        render_dashboard(config, &ctx, &self.analysis)
    }

    pub fn sidebar(&self, config: &PersonaConfig) -> SidebarView {
        render_sidebar(
            config,
            &self.records,
            self.selected().map(|r| r.id.as_str()),
        )
    }

    /// Route a widget interaction and apply whatever updates it produced at `now`.
    pub fn trigger(
        &mut self,
        config: &PersonaConfig,
        trigger: &ActionTrigger,
        now: DateTime<Utc>,
    ) -> DashboardResult<ActionResolution> {
        let pending: RefCell<Vec<(Record, Option<String>)>> = RefCell::new(Vec::new());
        let resolution = {
            let sink = |record: Record, message: Option<String>| {
                pending.borrow_mut().push((record, message));
            };
            let ctx =
                PersonaContext::build(config, &self.records, self.selected()).with_update_sink(&sink);
            trigger_action(config, &ctx, trigger)?
        };

        for (record, message) in pending.into_inner() {
            self.apply_update_at(record, message, now);
        }
        Ok(resolution)
    }

    /// Select the record behind a list or table row of `widget_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] if the widget has no rows or does not show `record_id`.
    pub fn select_row(
        &mut self,
        config: &PersonaConfig,
        widget_id: &str,
        record_id: &str,
    ) -> DashboardResult<()> {
        let chosen: RefCell<Option<String>> = RefCell::new(None);
        {
            let sink = |id: &str| {
                chosen.replace(Some(id.to_string()));
            };
            let ctx = PersonaContext::build(config, &self.records, self.selected())
                .with_selection_sink(&sink);
            select_row(config, &ctx, widget_id, record_id)?;
        }

        match chosen.into_inner() {
            Some(id) => self.select(&id),
            None => Ok(()),
        }
    }

    /// Mutation callback: replace the stored record with the same id.
    ///
    /// # Returns
    ///
    /// `false` if no stored record has that id; nothing changes.
    pub fn apply_update_at(
        &mut self,
        mut record: Record,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(slot) = self.records.iter_mut().find(|r| r.id == record.id) else {
            tracing::warn!("ignoring update for unknown record {}", record.id);
            return false;
        };

        record.last_updated = Some(now);
        let record_id = record.id.clone();
        *slot = record;

        if let Some(message) = message {
            tracing::info!("{}", message);
            if self.notifications.len() == NOTIFICATION_LOG_CAPACITY {
                self.notifications.pop_front();
            }
            self.notifications.push_back(Notification {
                record_id,
                message,
                at: now,
            });
        }
        true
    }

    /// Start an analysis run for the selected record on `widget_id`.
    ///
    /// # Returns
    ///
    /// The ticket and a copy of the record to analyse, or `None` if a run is already in
    /// flight for this widget and record.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] if the widget is not an AI-enabled analysis widget in the
    /// persona's layout, or if there is no record to analyse.
    pub fn begin_analysis(
        &mut self,
        config: &PersonaConfig,
        widget_id: &str,
    ) -> DashboardResult<Option<(AnalysisTicket, Record)>> {
        let widget = config
            .layout
            .widgets
            .iter()
            .find(|w| w.id == widget_id)
            .ok_or_else(|| DashboardError::UnknownWidget(widget_id.to_string()))?;

        match &widget.kind {
            WidgetKind::AiAnalysis(props) if props.ai_enabled => {}
            _ => {
                return Err(DashboardError::InvalidInput(format!(
                    "widget '{widget_id}' does not offer AI analysis"
                )))
            }
        }

        let record = self
            .selected()
            .cloned()
            .ok_or_else(|| DashboardError::InvalidInput("no record selected".into()))?;
        if self.analysis.selected() != Some(record.id.as_str()) {
            // The stored selection vanished and the session fell back to the first record.
            self.analysis.select(Some(&record.id));
        }

        Ok(self
            .analysis
            .begin(widget_id, &record.id)
            .map(|ticket| (ticket, record)))
    }

    pub fn complete_analysis(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        self.analysis.complete(ticket, outcome)
    }
}
