//! Read-only workflow and AI-capability catalog.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::session::CUSTOM_WORKFLOW_ID;

/// A selectable workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Typical pain points, offered as prompts on the pain-point stage.
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub ai_suggestions: Vec<String>,
}

/// Something AI can do, offered as a ready-made solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub use_case: String,
}

impl CapabilityDefinition {
    /// Text stored when this capability is attached as a solution.
    pub fn solution_text(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize catalog: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Catalog has no workflows")]
    NoWorkflows,

    #[error("Catalog has no AI capabilities")]
    NoCapabilities,

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Workflow id \"custom\" is reserved")]
    ReservedId,
}

/// The full catalog handed to the wizard as opaque configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub workflows: Vec<WorkflowDefinition>,
    pub capabilities: Vec<CapabilityDefinition>,
}

impl Catalog {
    pub fn workflow(&self, id: &str) -> Option<&WorkflowDefinition> {
        self.workflows.iter().find(|w| w.id == id)
    }

    pub fn capability(&self, id: &str) -> Option<&CapabilityDefinition> {
        self.capabilities.iter().find(|c| c.id == id)
    }

    /// Whether `id` names a catalog workflow or the custom sentinel.
    pub fn accepts_workflow_id(&self, id: &str) -> bool {
        id == CUSTOM_WORKFLOW_ID || self.workflow(id).is_some()
    }

    /// Parse and validate a catalog from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            warn!(path = ?path, error = %source, "catalog_read_failed");
            CatalogError::Read {
                path: path.display().to_string(),
                source,
            }
        })?;
        let catalog = Self::from_toml_str(&contents).inspect_err(|e| {
            warn!(path = ?path, error = %e, "catalog_invalid");
        })?;
        info!(
            path = ?path,
            workflows = catalog.workflows.len(),
            capabilities = catalog.capabilities.len(),
            "catalog_loaded"
        );
        Ok(catalog)
    }

    pub fn to_toml_string(&self) -> Result<String, CatalogError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.workflows.is_empty() {
            return Err(CatalogError::NoWorkflows);
        }
        if self.capabilities.is_empty() {
            return Err(CatalogError::NoCapabilities);
        }

        let mut seen = HashSet::new();
        for workflow in &self.workflows {
            if workflow.id == CUSTOM_WORKFLOW_ID {
                return Err(CatalogError::ReservedId);
            }
            if !seen.insert(workflow.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "workflow",
                    id: workflow.id.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for capability in &self.capabilities {
            if !seen.insert(capability.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "capability",
                    id: capability.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// The catalog shipped with the app.
    pub fn builtin() -> Self {
        Self {
            workflows: vec![
                workflow(
                    "meetings",
                    "Meeting Management",
                    "📋",
                    "Planning, running, and following up on meetings",
                    "Collaboration",
                    &[
                        "Taking notes while facilitating",
                        "Remembering to follow up on action items",
                        "Scheduling with multiple people",
                        "Writing meeting agendas from scratch",
                        "Tracking decisions across meetings",
                    ],
                    &[
                        "AI meeting transcription and summarization",
                        "Automated action item extraction and tracking",
                        "Smart scheduling assistants with availability checking",
                        "Dynamic meeting agenda generation",
                        "Decision tracking and searchable meeting database",
                    ],
                ),
                workflow(
                    "communication",
                    "Communication & Outreach",
                    "📧",
                    "Emails, newsletters, social media, donor communications",
                    "Outreach",
                    &[
                        "Writing similar emails repeatedly",
                        "Personalizing mass communications",
                        "Managing social media content",
                        "Translating materials for diverse audiences",
                        "Responding to common questions",
                    ],
                    &[
                        "Email template generation with personalization",
                        "Automated mail merge with smart customization",
                        "Social media content calendar and scheduling",
                        "Multi-language translation and localization",
                        "FAQ chatbot for common inquiries",
                    ],
                ),
                workflow(
                    "data",
                    "Data Collection & Analysis",
                    "📊",
                    "Surveys, reports, program evaluation, grant reporting",
                    "Analytics",
                    &[
                        "Manually organizing survey responses",
                        "Creating charts and visualizations from spreadsheets",
                        "Writing summary reports from raw data",
                        "Finding patterns in feedback and evaluations",
                        "Cleaning and standardizing messy data",
                    ],
                    &[
                        "Survey response categorization and summarization",
                        "Automated chart and visualization generation",
                        "Report draft creation from data analysis",
                        "Pattern recognition in qualitative feedback",
                        "Data cleaning and standardization tools",
                    ],
                ),
                workflow(
                    "admin",
                    "Administrative Tasks",
                    "📁",
                    "Scheduling, file organization, volunteer coordination",
                    "Operations",
                    &[
                        "Coordinating volunteer schedules and assignments",
                        "Organizing digital files and documents",
                        "Tracking program attendance and participation",
                        "Managing contact databases and information",
                        "Creating routine documents and forms",
                    ],
                    &[
                        "Volunteer scheduling system with preference matching",
                        "Smart file organization and tagging",
                        "Automated attendance tracking and reporting",
                        "CRM integration and contact management",
                        "Document template generation and form creation",
                    ],
                ),
                workflow(
                    "fundraising",
                    "Fundraising & Grants",
                    "💝",
                    "Grant writing, donor research, event planning",
                    "Development",
                    &[
                        "Researching potential donors and foundations",
                        "Tracking grant deadlines and requirements",
                        "Writing personalized thank you letters",
                        "Creating fundraising reports and impact stories",
                        "Finding and matching relevant grant opportunities",
                    ],
                    &[
                        "Donor research and prospect identification tools",
                        "Grant calendar automation and deadline tracking",
                        "Personalized thank you letter generation",
                        "Impact report builder with story creation",
                        "Grant matching service with requirement analysis",
                    ],
                ),
            ],
            capabilities: vec![
                capability(
                    "summarize",
                    "Summarizing",
                    "📝",
                    "Condense long documents, meeting notes, or emails into key points",
                    "Content Processing",
                    "Perfect for handling information overload",
                ),
                capability(
                    "draft",
                    "Drafting",
                    "✍️",
                    "Create first drafts of emails, reports, or proposals",
                    "Content Creation",
                    "Great for overcoming blank page syndrome",
                ),
                capability(
                    "analyze",
                    "Analyzing",
                    "📊",
                    "Find patterns in data, feedback, or survey responses",
                    "Data Analysis",
                    "Ideal for making sense of large datasets",
                ),
                capability(
                    "organize",
                    "Organizing",
                    "🗂️",
                    "Categorize information and create structure from chaos",
                    "Information Management",
                    "Essential for tackling disorganized information",
                ),
                capability(
                    "translate",
                    "Translating",
                    "🌐",
                    "Convert content between languages or simplify technical jargon",
                    "Communication",
                    "Valuable for reaching diverse audiences",
                ),
                capability(
                    "brainstorm",
                    "Brainstorming",
                    "💡",
                    "Generate ideas, solutions, or creative approaches",
                    "Ideation",
                    "Helpful when you need fresh perspectives",
                ),
            ],
        }
    }
}

fn workflow(
    id: &str,
    title: &str,
    icon: &str,
    description: &str,
    category: &str,
    examples: &[&str],
    ai_suggestions: &[&str],
) -> WorkflowDefinition {
    WorkflowDefinition {
        id: id.to_string(),
        title: title.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        examples: examples.iter().map(|s| s.to_string()).collect(),
        ai_suggestions: ai_suggestions.iter().map(|s| s.to_string()).collect(),
    }
}

fn capability(
    id: &str,
    name: &str,
    icon: &str,
    description: &str,
    category: &str,
    use_case: &str,
) -> CapabilityDefinition {
    CapabilityDefinition {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        use_case: use_case.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[[workflows]]
id = "board"
title = "Board Reporting"

[[capabilities]]
id = "summarize"
name = "Summarizing"
description = "Condense long documents"
"#;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.workflows.len(), 5);
        assert_eq!(catalog.capabilities.len(), 6);
    }

    #[test]
    fn test_builtin_lookup() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.workflow("meetings").map(|w| w.title.as_str()),
            Some("Meeting Management")
        );
        assert!(catalog.workflow("nope").is_none());
        assert!(catalog.capability("draft").is_some());
    }

    #[test]
    fn test_accepts_custom_and_known_ids() {
        let catalog = Catalog::builtin();
        assert!(catalog.accepts_workflow_id("custom"));
        assert!(catalog.accepts_workflow_id("fundraising"));
        assert!(!catalog.accepts_workflow_id("Fundraising"));
        assert!(!catalog.accepts_workflow_id(""));
    }

    #[test]
    fn test_capability_solution_text() {
        let catalog = Catalog::builtin();
        let cap = catalog.capability("brainstorm").unwrap();
        assert_eq!(
            cap.solution_text(),
            "Brainstorming: Generate ideas, solutions, or creative approaches"
        );
    }

    #[test]
    fn test_minimal_catalog_parses_with_defaults() {
        let catalog = Catalog::from_toml_str(MINIMAL).unwrap();
        assert_eq!(catalog.workflows[0].id, "board");
        assert!(catalog.workflows[0].examples.is_empty());
        assert_eq!(catalog.capabilities[0].icon, "");
    }

    #[test]
    fn test_reserved_custom_id_rejected() {
        let toml_str = MINIMAL.replace("id = \"board\"", "id = \"custom\"");
        let err = Catalog::from_toml_str(&toml_str).unwrap_err();
        assert!(matches!(err, CatalogError::ReservedId));
    }

    #[test]
    fn test_duplicate_workflow_rejected() {
        let toml_str = format!(
            "{}\n[[workflows]]\nid = \"board\"\ntitle = \"Again\"\n",
            MINIMAL
        );
        let err = Catalog::from_toml_str(&toml_str).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateId {
                kind: "workflow",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_capabilities_rejected() {
        let toml_str = "capabilities = []\n\n[[workflows]]\nid = \"a\"\ntitle = \"A\"\n";
        let err = Catalog::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, CatalogError::NoCapabilities));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = Catalog::from_toml_str("workflows = 3").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_builtin_survives_toml_dump() {
        let catalog = Catalog::builtin();
        let dumped = catalog.to_toml_string().unwrap();
        assert_eq!(Catalog::from_toml_str(&dumped).unwrap(), catalog);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        fs::write(&path, MINIMAL).unwrap();
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.workflows.len(), 1);
    }
}
