//! Metric tiles: the metrics grid and the single metric card.
//!
//! A tile's key is resolved once when the configuration loads. Keys naming a live
//! aggregate become [`MetricSource::Computed`] and ignore any configured literal; every
//! other key keeps its literal value verbatim.

use super::WidgetConfig;
use crate::constants::MISSING_VALUE;
use crate::context::PersonaContext;
use crate::record::{Record, RecordStatus, Urgency};
use serde::{Deserialize, Serialize};

/// Aggregates computed from the context's records at render time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ComputedMetric {
    /// Records still in Intake Review.
    Pending,
    UrgentCount,
    TotalPatients,
}

impl ComputedMetric {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "pending" => Some(Self::Pending),
            "urgentCount" => Some(Self::UrgentCount),
            "totalPatients" => Some(Self::TotalPatients),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UrgentCount => "urgentCount",
            Self::TotalPatients => "totalPatients",
        }
    }

    pub fn compute(&self, records: &[Record]) -> usize {
        match self {
            Self::Pending => records
                .iter()
                .filter(|r| r.status == RecordStatus::IntakeReview)
                .count(),
            Self::UrgentCount => records
                .iter()
                .filter(|r| r.urgency == Urgency::Urgent)
                .count(),
            Self::TotalPatients => records.len(),
        }
    }
}

/// A literal configured value, or a computed count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(i64),
    Decimal(f64),
    Text(String),
}

impl MetricValue {
    fn count(value: usize) -> Self {
        Self::Number(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MetricSource {
    Computed(ComputedMetric),
    Literal(Option<MetricValue>),
}

impl MetricSource {
    pub fn value(&self, records: &[Record]) -> MetricValue {
        match self {
            Self::Computed(metric) => MetricValue::count(metric.compute(records)),
            Self::Literal(Some(value)) => value.clone(),
            Self::Literal(None) => MetricValue::Text(MISSING_VALUE.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricVariant {
    #[default]
    Default,
    Primary,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trend {
    pub value: f64,
    pub direction: TrendDirection,
    #[serde(default, alias = "isPositive")]
    pub is_positive: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "MetricTileWire")]
pub struct MetricTile {
    pub key: String,
    pub label: String,
    pub source: MetricSource,
    pub icon: Option<String>,
    pub variant: MetricVariant,
    pub trend: Option<Trend>,
}

impl MetricTile {
    fn render(&self, records: &[Record]) -> MetricTileView {
        MetricTileView {
            key: self.key.clone(),
            label: self.label.clone(),
            value: self.source.value(records),
            computed: matches!(self.source, MetricSource::Computed(_)),
            icon: self.icon.clone(),
            variant: self.variant,
            trend: self.trend.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricTileWire {
    key: String,
    label: String,
    #[serde(default)]
    value: Option<MetricValue>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    variant: MetricVariant,
    #[serde(default)]
    trend: Option<Trend>,
}

impl From<MetricTileWire> for MetricTile {
    fn from(wire: MetricTileWire) -> Self {
        let source = match ComputedMetric::from_key(&wire.key) {
            Some(metric) => MetricSource::Computed(metric),
            None => MetricSource::Literal(wire.value),
        };
        Self {
            key: wire.key,
            label: wire.label,
            source,
            icon: wire.icon,
            variant: wire.variant,
            trend: wire.trend,
        }
    }
}

// ============================================================================
// Metrics grid
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsGridProps {
    pub metrics: Vec<MetricTile>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricTileView {
    pub key: String,
    pub label: String,
    pub value: MetricValue,
    /// False when the value is the configured literal.
    pub computed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub variant: MetricVariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsGridView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub tiles: Vec<MetricTileView>,
}

pub fn render_grid(
    widget: &WidgetConfig,
    props: &MetricsGridProps,
    ctx: &PersonaContext<'_>,
) -> MetricsGridView {
    MetricsGridView {
        title: widget.title.clone(),
        tiles: props
            .metrics
            .iter()
            .map(|tile| tile.render(&ctx.records))
            .collect(),
    }
}

// ============================================================================
// Metric card
// ============================================================================

/// A single tile. Only `totalPatients` and `urgentCount` are live here; any other
/// `value_key`, including `pending`, shows the literal `value`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "MetricCardWire")]
pub struct MetricCardProps {
    pub tile: MetricTile,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricCardWire {
    label: String,
    #[serde(default, alias = "valueKey")]
    value_key: Option<String>,
    #[serde(default)]
    value: Option<MetricValue>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    variant: MetricVariant,
    #[serde(default)]
    trend: Option<Trend>,
}

impl From<MetricCardWire> for MetricCardProps {
    fn from(wire: MetricCardWire) -> Self {
        let computed = wire
            .value_key
            .as_deref()
            .and_then(ComputedMetric::from_key)
            .filter(|metric| {
                matches!(metric, ComputedMetric::TotalPatients | ComputedMetric::UrgentCount)
            });
        let source = match computed {
            Some(metric) => MetricSource::Computed(metric),
            None => MetricSource::Literal(wire.value),
        };
        Self {
            tile: MetricTile {
                key: wire.value_key.unwrap_or_default(),
                label: wire.label,
                source,
                icon: wire.icon,
                variant: wire.variant,
                trend: wire.trend,
            },
        }
    }
}

pub fn render_card(props: &MetricCardProps, ctx: &PersonaContext<'_>) -> MetricTileView {
    props.tile.render(&ctx.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{PersonaIdentity, PersonaRegistry};
    use crate::record::fixtures::{record, urgent};
    use crate::widgets::test_support::widget;
    use crate::widgets::WidgetKind;

    fn records() -> Vec<Record> {
        vec![
            urgent("1", RecordStatus::IntakeReview),
            record("2", RecordStatus::IntakeReview),
            urgent("3", RecordStatus::Confirmed),
            record("4", RecordStatus::Scheduled),
        ]
    }

    #[test]
    fn computed_keys_override_literals() {
        let w = widget(
            "kpis",
            WidgetKind::METRICS_GRID,
            r#"metrics:
  - { key: urgentCount, label: Urgent, value: 999 }
  - { key: pending, label: Pending Review }
  - { key: totalPatients, label: Total }
  - { key: avgWait, label: Avg Wait, value: "12 days", trend: { value: 4.5, direction: down, isPositive: true } }
  - { key: breaches, label: Breaches }
"#,
        );
        let WidgetKind::MetricsGrid(props) = &w.kind else {
            panic!("expected metrics grid");
        };

        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let data = records();
        let ctx = PersonaContext::build(registry.lookup(PersonaIdentity::Management), &data, None);
        let view = render_grid(&w, props, &ctx);

        let values: Vec<String> = view.tiles.iter().map(|t| t.value.to_string()).collect();
        assert_eq!(values, vec!["2", "2", "4", "12 days", "N/A"]);
        assert!(view.tiles[0].computed);
        assert!(!view.tiles[3].computed);
        assert_eq!(
            view.tiles[3].trend.as_ref().map(|t| t.direction),
            Some(TrendDirection::Down)
        );
    }

    #[test]
    fn card_only_computes_total_and_urgent() {
        let registry = PersonaRegistry::builtin().expect("builtin registry");
        let data = records();
        let ctx = PersonaContext::build(registry.lookup(PersonaIdentity::Management), &data, None);

        let w = widget(
            "urgent",
            WidgetKind::METRIC_CARD,
            "label: Urgent\nvalue_key: urgentCount\nvalue: 0",
        );
        let WidgetKind::MetricCard(props) = &w.kind else {
            panic!("expected metric card");
        };
        assert_eq!(render_card(props, &ctx).value, MetricValue::Number(2));

        let w = widget(
            "pending",
            WidgetKind::METRIC_CARD,
            "label: Pending\nvalueKey: pending\nvalue: 7",
        );
        let WidgetKind::MetricCard(props) = &w.kind else {
            panic!("expected metric card");
        };
        let view = render_card(props, &ctx);
        assert_eq!(view.value, MetricValue::Number(7));
        assert!(!view.computed);
    }

    #[test]
    fn literal_values_keep_their_shape() {
        let w = widget("ratio", WidgetKind::METRIC_CARD, "label: Utilisation\nvalue: 0.85");
        let WidgetKind::MetricCard(props) = &w.kind else {
            panic!("expected metric card");
        };
        assert_eq!(
            props.tile.source,
            MetricSource::Literal(Some(MetricValue::Decimal(0.85)))
        );
    }

    #[test]
    fn computed_counts_follow_filtered_context() {
        let data = records();
        assert_eq!(ComputedMetric::Pending.compute(&data), 2);
        assert_eq!(ComputedMetric::UrgentCount.compute(&data), 2);
        assert_eq!(ComputedMetric::TotalPatients.compute(&[]), 0);
    }
}
