//! Constants used throughout the Careboard core crate.
//!
//! Placeholder copy and defaults live here so that every widget renders the same text for
//! the same condition.

/// Grid column count used when a layout does not configure one.
pub const DEFAULT_LAYOUT_COLUMNS: u32 = 3;

/// Grid gap used when a layout does not configure one.
pub const DEFAULT_LAYOUT_GAP: u32 = 6;

/// Span used when a widget does not configure one.
pub const DEFAULT_WIDGET_SPAN: u32 = 1;

/// Rendered in place of a record field that is missing or empty.
pub const MISSING_VALUE: &str = "N/A";

/// Empty-state headline shown instead of the grid.
pub const EMPTY_STATE_TITLE: &str = "No patients available.";

/// Empty-state hint shown instead of the grid.
pub const EMPTY_STATE_HINT: &str = "Select a patient from the sidebar or wait for new referrals.";

/// Placeholder for the patient details widget when nothing is selected.
pub const NO_SELECTION_MESSAGE: &str = "No patient selected";

/// Default empty message for table widgets.
pub const TABLE_EMPTY_MESSAGE: &str = "No data available";

/// Default empty message for list widgets.
pub const LIST_EMPTY_MESSAGE: &str = "No items";

/// Shown by the analysis widget when a record has no comorbidities.
pub const NO_HISTORY_MESSAGE: &str = "No documented history";

/// Action invoked by table action columns when none is configured.
pub const DEFAULT_TABLE_ACTION_ID: &str = "find-slot";

/// Button label for table action columns when none is configured.
pub const DEFAULT_TABLE_ACTION_LABEL: &str = "Find Slot";

/// Comorbidity fragments that indicate anticoagulant therapy (matched case-insensitively).
pub const ANTICOAGULANT_MARKERS: [&str; 2] = ["warfarin", "anticoagulant"];

pub const ANTICOAGULANT_ALERT_TITLE: &str = "Anticoagulant Safety Alert";

pub const ANTICOAGULANT_ALERT_MESSAGE: &str =
    "Patient on Warfarin. Requires INR check pre-op. Adjust procedure coding.";

/// Number of notifications retained by a session.
pub const NOTIFICATION_LOG_CAPACITY: usize = 20;

/// Default timeout applied by hosts to analysis collaborator calls.
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;

/// Default bind address for the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default records file used by the binaries.
pub const DEFAULT_RECORDS_PATH: &str = "data/records.json";
