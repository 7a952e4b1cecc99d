//! Provider catalog types: descriptors, capabilities, task types, selections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Boolean capability flags of a provider.
///
/// The same shape doubles as a requirement set: a task's requirements are
/// the flags set to `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub function_calling: bool,
    #[serde(default)]
    pub vision: bool,
    #[serde(default)]
    pub long_context: bool,
}

impl ProviderCapabilities {
    /// No requirements; every provider satisfies it.
    pub const NONE: Self = Self {
        streaming: false,
        function_calling: false,
        vision: false,
        long_context: false,
    };

    /// Every capability flag set.
    pub const ALL: Self = Self {
        streaming: true,
        function_calling: true,
        vision: true,
        long_context: true,
    };

    /// Whether `self` has every capability that is `true` in `required`.
    pub fn satisfies(&self, required: &ProviderCapabilities) -> bool {
        (!required.streaming || self.streaming)
            && (!required.function_calling || self.function_calling)
            && (!required.vision || self.vision)
            && (!required.long_context || self.long_context)
    }

    /// Names of the flags set to `true`, in declaration order.
    pub fn enabled_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(4);
        if self.streaming {
            names.push("streaming");
        }
        if self.function_calling {
            names.push("functionCalling");
        }
        if self.vision {
            names.push("vision");
        }
        if self.long_context {
            names.push("longContext");
        }
        names
    }
}

/// One integration target in the provider registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    /// Unique symbolic name, also used to persist user preference.
    pub id: String,
    pub display_name: String,
    /// Model identifiers this provider exposes; the first is the default.
    pub models: Vec<String>,
    /// Computed once at startup from credential presence.
    pub available: bool,
    /// Lower sorts first.
    pub priority: u32,
    pub capabilities: ProviderCapabilities,
}

impl ProviderDescriptor {
    /// First-choice model, if any models are declared.
    pub fn default_model(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }
}

/// Closed set of AI-assisted features, each with fixed capability needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Game idea generation.
    Oracle,
    /// Scope and viability analysis.
    Scope,
    /// Task breakdown for a kanban board.
    Kanban,
    /// Asset list planning.
    Assets,
    /// Free-form conversation.
    Chat,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Oracle,
        TaskType::Scope,
        TaskType::Kanban,
        TaskType::Assets,
        TaskType::Chat,
    ];

    /// Static capability requirements for this task.
    pub fn required_capabilities(self) -> ProviderCapabilities {
        match self {
            TaskType::Oracle => ProviderCapabilities {
                streaming: true,
                ..ProviderCapabilities::NONE
            },
            TaskType::Scope => ProviderCapabilities {
                function_calling: true,
                long_context: true,
                ..ProviderCapabilities::NONE
            },
            TaskType::Kanban => ProviderCapabilities {
                function_calling: true,
                ..ProviderCapabilities::NONE
            },
            TaskType::Assets => ProviderCapabilities::NONE,
            TaskType::Chat => ProviderCapabilities {
                streaming: true,
                long_context: true,
                ..ProviderCapabilities::NONE
            },
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Oracle => write!(f, "oracle"),
            TaskType::Scope => write!(f, "scope"),
            TaskType::Kanban => write!(f, "kanban"),
            TaskType::Assets => write!(f, "assets"),
            TaskType::Chat => write!(f, "chat"),
        }
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oracle" => Ok(TaskType::Oracle),
            "scope" => Ok(TaskType::Scope),
            "kanban" => Ok(TaskType::Kanban),
            "assets" => Ok(TaskType::Assets),
            "chat" => Ok(TaskType::Chat),
            other => Err(format!("invalid task type: '{other}'")),
        }
    }
}

/// The provider and model chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub provider: ProviderDescriptor,
    pub model: String,
}

impl ModelSelection {
    pub fn new(provider: ProviderDescriptor, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider.id
    }
}
