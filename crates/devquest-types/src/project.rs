//! Project context types used to enrich prompts.
//!
//! A `ProjectContext` is a partially-filled description of the active game
//! project: a GDD-like record plus an optional scope analysis. Every field is
//! optional; absent fields are simply left out of composed prompts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One field of the game design document, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GddField {
    Name,
    Genre,
    Theme,
    CoreMechanic,
    ArtStyle,
    ElevatorPitch,
}

impl GddField {
    /// Fixed order used when composing prompts.
    pub const ORDER: [GddField; 6] = [
        GddField::Name,
        GddField::Genre,
        GddField::Theme,
        GddField::CoreMechanic,
        GddField::ArtStyle,
        GddField::ElevatorPitch,
    ];

    /// Human label used in bullet lines.
    pub fn label(self) -> &'static str {
        match self {
            GddField::Name => "Name",
            GddField::Genre => "Genre",
            GddField::Theme => "Theme",
            GddField::CoreMechanic => "Core Mechanic",
            GddField::ArtStyle => "Art Style",
            GddField::ElevatorPitch => "Elevator Pitch",
        }
    }
}

impl FromStr for GddField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "name" => Ok(GddField::Name),
            "genre" => Ok(GddField::Genre),
            "theme" => Ok(GddField::Theme),
            "coremechanic" => Ok(GddField::CoreMechanic),
            "artstyle" => Ok(GddField::ArtStyle),
            "elevatorpitch" => Ok(GddField::ElevatorPitch),
            other => Err(format!("invalid GDD field: '{other}'")),
        }
    }
}

/// GDD-like record describing the game. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDesignDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_mechanic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevator_pitch: Option<String>,
}

impl GameDesignDoc {
    fn slot(&self, field: GddField) -> &Option<String> {
        match field {
            GddField::Name => &self.name,
            GddField::Genre => &self.genre,
            GddField::Theme => &self.theme,
            GddField::CoreMechanic => &self.core_mechanic,
            GddField::ArtStyle => &self.art_style,
            GddField::ElevatorPitch => &self.elevator_pitch,
        }
    }

    fn slot_mut(&mut self, field: GddField) -> &mut Option<String> {
        match field {
            GddField::Name => &mut self.name,
            GddField::Genre => &mut self.genre,
            GddField::Theme => &mut self.theme,
            GddField::CoreMechanic => &mut self.core_mechanic,
            GddField::ArtStyle => &mut self.art_style,
            GddField::ElevatorPitch => &mut self.elevator_pitch,
        }
    }

    /// Present value of a field; blank strings count as absent.
    pub fn get(&self, field: GddField) -> Option<&str> {
        self.slot(field)
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Patch one field. `None` or a blank value clears it.
    pub fn set(&mut self, field: GddField, value: Option<String>) {
        *self.slot_mut(field) = value.filter(|v| !v.trim().is_empty());
    }

    /// Whether no field carries a value.
    pub fn is_empty(&self) -> bool {
        GddField::ORDER.iter().all(|f| self.get(*f).is_none())
    }
}

/// Traffic-light risk rating of a scope analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Green,
    Yellow,
    Red,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Green => write!(f, "green"),
            RiskLevel::Yellow => write!(f, "yellow"),
            RiskLevel::Red => write!(f, "red"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "green" => Ok(RiskLevel::Green),
            "yellow" => Ok(RiskLevel::Yellow),
            "red" => Ok(RiskLevel::Red),
            other => Err(format!("invalid risk level: '{other}'")),
        }
    }
}

/// Result of a scope/viability analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScopeReport {
    /// Viability score from 0 to 100.
    pub score: u8,
    pub risk_level: RiskLevel,
    /// Ordered milestones that gate shipping.
    #[serde(default)]
    pub critical_path: Vec<String>,
}

impl ScopeReport {
    pub const MAX_SCORE: u8 = 100;

    /// Range checks serde cannot express.
    pub fn check(&self) -> Result<(), String> {
        if self.score > Self::MAX_SCORE {
            return Err(format!(
                "score {} is outside 0-{}",
                self.score,
                Self::MAX_SCORE
            ));
        }
        Ok(())
    }
}

/// Priority of a planned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

/// One card on a generated kanban board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KanbanTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate_hours: Option<f32>,
}

/// Generated task breakdown for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KanbanBoard {
    pub tasks: Vec<KanbanTask>,
}

/// The active project as seen by prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    #[serde(default)]
    pub gdd: GameDesignDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_report: Option<ScopeReport>,
}

impl ProjectContext {
    pub fn new(gdd: GameDesignDoc) -> Self {
        Self {
            gdd,
            scope_report: None,
        }
    }

    /// No GDD values and no scope report.
    pub fn is_empty(&self) -> bool {
        self.gdd.is_empty() && self.scope_report.is_none()
    }

    /// Patch a single GDD field.
    pub fn set_field(&mut self, field: GddField, value: Option<String>) {
        self.gdd.set(field, value);
    }

    pub fn set_scope_report(&mut self, report: Option<ScopeReport>) {
        self.scope_report = report;
    }

    /// Replace the whole context, returning the previous one.
    pub fn replace(&mut self, other: ProjectContext) -> ProjectContext {
        std::mem::replace(self, other)
    }
}
