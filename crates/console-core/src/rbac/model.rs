use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::serde_utils::{deserialize_labels, serialize_labels, upsert_label};
use crate::sets::sorted_set;

/// Kind of project resource a policy applies to.
///
/// `Unspecified` is what an unknown token maps to. It is never produced
/// from a known name and never grants anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    #[default]
    Unspecified,
    All,
    Application,
    Deployment,
    Event,
    Piped,
    DeploymentChain,
    Project,
    ApiKey,
    Insight,
}

impl ResourceType {
    /// Mapped values in table order.
    pub const MAPPED: [ResourceType; 9] = [
        ResourceType::All,
        ResourceType::Application,
        ResourceType::Deployment,
        ResourceType::Event,
        ResourceType::Piped,
        ResourceType::DeploymentChain,
        ResourceType::Project,
        ResourceType::ApiKey,
        ResourceType::Insight,
    ];

    /// Canonical policy-text spelling.
    pub fn as_text(&self) -> &'static str {
        match self {
            ResourceType::Unspecified => "unspecified",
            ResourceType::All => "*",
            ResourceType::Application => "application",
            ResourceType::Deployment => "deployment",
            ResourceType::Event => "event",
            ResourceType::Piped => "piped",
            ResourceType::DeploymentChain => "deploymentChain",
            ResourceType::Project => "project",
            ResourceType::ApiKey => "apiKey",
            ResourceType::Insight => "insight",
        }
    }

    /// Upper-snake enum name used by the backend API.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Unspecified => "UNSPECIFIED",
            ResourceType::All => "ALL",
            ResourceType::Application => "APPLICATION",
            ResourceType::Deployment => "DEPLOYMENT",
            ResourceType::Event => "EVENT",
            ResourceType::Piped => "PIPED",
            ResourceType::DeploymentChain => "DEPLOYMENT_CHAIN",
            ResourceType::Project => "PROJECT",
            ResourceType::ApiKey => "API_KEY",
            ResourceType::Insight => "INSIGHT",
        }
    }

    /// Map a token to a resource type; unknown tokens give `Unspecified`.
    pub fn from_text(text: &str) -> Self {
        if let Some(t) = Self::MAPPED.iter().find(|t| t.as_text() == text) {
            return *t;
        }
        Self::MAPPED
            .iter()
            .copied()
            .find(|t| t.as_text().eq_ignore_ascii_case(text) || t.name().eq_ignore_ascii_case(text))
            .unwrap_or(ResourceType::Unspecified)
    }

    pub fn is_mapped(&self) -> bool {
        *self != ResourceType::Unspecified
    }
}

/// Operation a policy permits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    #[default]
    Unspecified,
    All,
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Mapped values in table order.
    pub const MAPPED: [Action; 6] = [
        Action::All,
        Action::Get,
        Action::List,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    pub fn as_text(&self) -> &'static str {
        match self {
            Action::Unspecified => "unspecified",
            Action::All => "*",
            Action::Get => "get",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Unspecified => "UNSPECIFIED",
            Action::All => "ALL",
            Action::Get => "GET",
            Action::List => "LIST",
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }

    /// Map a token to an action; unknown tokens give `Unspecified`.
    pub fn from_text(text: &str) -> Self {
        if let Some(a) = Self::MAPPED.iter().find(|a| a.as_text() == text) {
            return *a;
        }
        Self::MAPPED
            .iter()
            .copied()
            .find(|a| a.as_text().eq_ignore_ascii_case(text) || a.name().eq_ignore_ascii_case(text))
            .unwrap_or(Action::Unspecified)
    }

    pub fn is_mapped(&self) -> bool {
        *self != Action::Unspecified
    }
}

impl Serialize for ResourceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_text())
    }
}

impl<'de> Deserialize<'de> for ResourceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(ResourceType::from_text(&text))
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_text())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Action::from_text(&text))
    }
}

/// Canonical texts of every mapped resource type, in table order.
pub fn resource_type_names() -> Vec<&'static str> {
    ResourceType::MAPPED.iter().map(ResourceType::as_text).collect()
}

/// Canonical texts of every mapped action, in table order.
pub fn action_names() -> Vec<&'static str> {
    Action::MAPPED.iter().map(Action::as_text).collect()
}

/// A resource filter: a type plus optional exact-match labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResource {
    #[serde(rename = "type", default)]
    pub resource_type: ResourceType,
    #[serde(
        default,
        serialize_with = "serialize_labels",
        deserialize_with = "deserialize_labels"
    )]
    pub labels: Vec<(String, String)>,
}

impl PolicyResource {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            labels: Vec::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_label(key, value);
        self
    }

    /// Set a label; an existing key keeps its position.
    pub fn insert_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        upsert_label(&mut self.labels, key.into(), value.into());
    }

    fn normalized(&self) -> (ResourceType, Vec<(String, String)>) {
        (self.resource_type, sorted_set(self.labels.iter().cloned()))
    }
}

impl fmt::Display for PolicyResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_type.as_text())?;
        if self.labels.is_empty() {
            return Ok(());
        }
        let labels = self
            .labels
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{{{labels}}}")
    }
}

/// Resources paired with the actions allowed on them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub resources: Vec<PolicyResource>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Policy {
    pub fn new(resources: Vec<PolicyResource>, actions: Vec<Action>) -> Self {
        Self { resources, actions }
    }

    /// Same resource set (type and label set) and same action set.
    ///
    /// Order, duplicates, and label order do not matter.
    pub fn is_equivalent(&self, other: &Policy) -> bool {
        sorted_set(self.resources.iter().map(PolicyResource::normalized))
            == sorted_set(other.resources.iter().map(PolicyResource::normalized))
            && sorted_set(self.actions.iter().copied()) == sorted_set(other.actions.iter().copied())
    }
}

/// A policy that carries a value the backend cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("policy {policy}: resource {resource} has an unknown type")]
    UnmappedResource { policy: usize, resource: usize },

    #[error("policy {policy}: action {action} is unknown")]
    UnmappedAction { policy: usize, action: usize },
}
