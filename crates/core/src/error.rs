use crate::persona::PersonaIdentity;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("persona configuration schema mismatch in {source_name} at {path}: {message}")]
    PersonaSchema {
        source_name: String,
        path: String,
        message: String,
    },
    #[error("invalid properties for widget '{widget_id}' ({kind}) at {path}: {message}")]
    WidgetProps {
        widget_id: String,
        kind: &'static str,
        path: String,
        message: String,
    },
    #[error("duplicate widget id '{widget_id}' in {persona} layout")]
    DuplicateWidgetId {
        persona: PersonaIdentity,
        widget_id: String,
    },
    #[error("action '{action_id}' references unknown handler '{handler}'")]
    UnknownHandler { action_id: String, handler: String },
    #[error("no configuration registered for persona {0}")]
    MissingPersona(PersonaIdentity),
    #[error("persona {0} is configured more than once")]
    DuplicatePersona(PersonaIdentity),
    #[error("widget '{0}' is not part of the active layout")]
    UnknownWidget(String),
    #[error("widget '{widget_id}' does not offer action '{action_id}'")]
    UnknownAction { widget_id: String, action_id: String },
    #[error("record '{0}' is not visible to the active persona")]
    UnknownRecord(String),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write records file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to deserialize records: {0}")]
    RecordsDeserialization(serde_json::Error),
    #[error("failed to deserialize YAML records: {0}")]
    RecordsYamlDeserialization(serde_yaml::Error),
    #[error("failed to serialize records: {0}")]
    RecordsSerialization(serde_json::Error),
    #[error("failed to serialize YAML records: {0}")]
    RecordsYamlSerialization(serde_yaml::Error),
}

pub type DashboardResult<T> = std::result::Result<T, DashboardError>;
