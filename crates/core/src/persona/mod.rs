//! Persona identities, their configurations, and the registry that maps one to the other.
//!
//! The registry is built once at session start (from the embedded persona files or from a
//! directory of persona files) and is read-only afterwards. It is passed explicitly into the
//! render and action entry points; there is no process-wide instance.
//!
//! Totality: every [`PersonaIdentity`] has exactly one slot in [`PersonaRegistry`], so
//! [`PersonaRegistry::lookup`] is a plain `match` and cannot fail. Gaps or duplicates are
//! rejected while the registry is being constructed.

mod wire;

pub use wire::parse_persona_yaml;

use crate::actions::{ActionConfig, CommandRegistry};
use crate::filter::RecordPredicate;
use crate::layout::LayoutConfig;
use crate::{DashboardError, DashboardResult};
use careboard_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The role a user is working as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonaIdentity {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "clinician")]
    Clinician,
    #[serde(rename = "waiting-list")]
    WaitingListOffice,
    #[serde(rename = "management")]
    Management,
}

impl PersonaIdentity {
    pub const ALL: [PersonaIdentity; 4] = [
        PersonaIdentity::Admin,
        PersonaIdentity::Clinician,
        PersonaIdentity::WaitingListOffice,
        PersonaIdentity::Management,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Clinician => "clinician",
            Self::WaitingListOffice => "waiting-list",
            Self::Management => "management",
        }
    }
}

impl std::fmt::Display for PersonaIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PersonaIdentity {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| DashboardError::InvalidInput(format!("unknown persona: {s}")))
    }
}

/// Display metadata for a persona.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonaMeta {
    pub persona: PersonaIdentity,
    pub display_name: NonEmptyText,
    pub subtitle: String,
    pub description: String,
    pub icon: String,
}

/// Side-navigation behaviour for a persona.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SidebarConfig {
    #[serde(default)]
    pub show_patient_list: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<RecordPredicate>,
}

#[derive(Clone, Debug)]
pub struct PersonaConfig {
    pub persona: PersonaIdentity,
    pub meta: PersonaMeta,
    /// Main dashboard filter. `None` passes every record.
    pub filter: Option<RecordPredicate>,
    pub layout: LayoutConfig,
    pub sidebar: Option<SidebarConfig>,
    pub actions: Vec<ActionConfig>,
}

impl PersonaConfig {
    pub fn find_action(&self, action_id: &str) -> Option<&ActionConfig> {
        self.actions.iter().find(|a| a.id == action_id)
    }
}

const BUILTIN_PERSONAS: [(&str, &str); 4] = [
    ("admin.yaml", include_str!("../../personas/admin.yaml")),
    ("clinician.yaml", include_str!("../../personas/clinician.yaml")),
    ("waiting-list.yaml", include_str!("../../personas/waiting-list.yaml")),
    ("management.yaml", include_str!("../../personas/management.yaml")),
];

/// Immutable persona → configuration mapping.
#[derive(Clone, Debug)]
pub struct PersonaRegistry {
    admin: PersonaConfig,
    clinician: PersonaConfig,
    waiting_list: PersonaConfig,
    management: PersonaConfig,
}

impl PersonaRegistry {
    /// Builds the registry from the persona files compiled into this crate.
    pub fn builtin() -> DashboardResult<Self> {
        Self::builtin_with(&CommandRegistry::builtin())
    }

    /// Builds the built-in personas, resolving handlers against `commands`.
    pub fn builtin_with(commands: &CommandRegistry) -> DashboardResult<Self> {
        let configs = BUILTIN_PERSONAS
            .iter()
            .map(|(name, text)| parse_persona_yaml(name, text, commands))
            .collect::<DashboardResult<Vec<_>>>()?;
        Self::from_configs(configs)
    }

    /// Builds the registry from every `*.yaml`/`*.yml` file in `dir`.
    ///
    /// Files are read in name order so that diagnostics are deterministic.
    pub fn from_dir(dir: &Path, commands: &CommandRegistry) -> DashboardResult<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(DashboardError::FileRead)? {
            let path = entry.map_err(DashboardError::FileRead)?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }
        paths.sort();

        let mut configs = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(DashboardError::FileRead)?;
            let name = path.display().to_string();
            configs.push(parse_persona_yaml(&name, &text, commands)?);
        }

        tracing::info!(
            "loaded {} persona configurations from {}",
            configs.len(),
            dir.display()
        );
        Self::from_configs(configs)
    }

    /// Validates that `configs` covers every persona exactly once.
    pub fn from_configs(configs: Vec<PersonaConfig>) -> DashboardResult<Self> {
        let mut admin = None;
        let mut clinician = None;
        let mut waiting_list = None;
        let mut management = None;

        for config in configs {
            let persona = config.persona;
            let slot = match persona {
                PersonaIdentity::Admin => &mut admin,
                PersonaIdentity::Clinician => &mut clinician,
                PersonaIdentity::WaitingListOffice => &mut waiting_list,
                PersonaIdentity::Management => &mut management,
            };
            if slot.replace(config).is_some() {
                return Err(DashboardError::DuplicatePersona(persona));
            }
        }

        Ok(Self {
            admin: admin.ok_or(DashboardError::MissingPersona(PersonaIdentity::Admin))?,
            clinician: clinician
                .ok_or(DashboardError::MissingPersona(PersonaIdentity::Clinician))?,
            waiting_list: waiting_list.ok_or(DashboardError::MissingPersona(
                PersonaIdentity::WaitingListOffice,
            ))?,
            management: management
                .ok_or(DashboardError::MissingPersona(PersonaIdentity::Management))?,
        })
    }

    pub fn lookup(&self, persona: PersonaIdentity) -> &PersonaConfig {
        match persona {
            PersonaIdentity::Admin => &self.admin,
            PersonaIdentity::Clinician => &self.clinician,
            PersonaIdentity::WaitingListOffice => &self.waiting_list,
            PersonaIdentity::Management => &self.management,
        }
    }

    /// Iterates configurations in [`PersonaIdentity::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &PersonaConfig> {
        PersonaIdentity::ALL.into_iter().map(|p| self.lookup(p))
    }
}
