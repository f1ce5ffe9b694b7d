//! Plan export: a summary of the finished session, written as Markdown or JSON.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::session::{Badge, SessionState, Severity, SolutionOrigin};
use crate::views::workflow_title;

/// Base file name for exported plans.
pub const PLAN_FILE_STEM: &str = "AI-Workflow-Enhancement-Plan";

const NEXT_STEPS: [&str; 7] = [
    "Review this plan with your team to gather feedback and buy-in",
    "Choose one pain point to tackle first (recommend starting with quick wins)",
    "Set up the necessary tools and provide basic training to team members",
    "Implement the AI solution for 2-4 weeks as a pilot",
    "Measure time saved and gather team feedback",
    "Refine the approach based on results",
    "Roll out to additional pain points once the first is successful",
];

const CLOSING_NOTE: &str = "**Remember:** AI augmentation is about making your work easier, \
                            not replacing human judgment and creativity!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "Markdown",
            ExportFormat::Json => "JSON",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.{}", PLAN_FILE_STEM, self.extension())
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize plan: {0}")]
    Json(#[from] serde_json::Error),
}

/// One pain point with everything attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanPainPoint {
    pub number: usize,
    pub text: String,
    pub severity: Severity,
    pub focused: bool,
    pub ai_solutions: Vec<String>,
    pub user_solutions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_tools: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needed_tools: Option<String>,
}

impl PlanPainPoint {
    fn has_solutions(&self) -> bool {
        !self.ai_solutions.is_empty() || !self.user_solutions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub workflow_title: String,
    pub generated_on: NaiveDate,
    pub score: u32,
    pub badges: Vec<Badge>,
    pub pain_points: Vec<PlanPainPoint>,
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

impl PlanSummary {
    pub fn from_state(state: &SessionState, catalog: &Catalog, generated_on: NaiveDate) -> Self {
        let pain_points = state
            .pain_points
            .iter()
            .enumerate()
            .map(|(index, pain)| {
                let solutions = state.solutions_for(index);
                let texts = |origin: SolutionOrigin| -> Vec<String> {
                    solutions
                        .iter()
                        .filter(|s| s.origin == origin)
                        .map(|s| s.text.clone())
                        .collect()
                };
                let (existing, needed) = state.tools_for(index);
                PlanPainPoint {
                    number: index + 1,
                    text: pain.text.clone(),
                    severity: pain.severity,
                    focused: state.focused_pain_point == Some(index),
                    ai_solutions: texts(SolutionOrigin::AiSuggested),
                    user_solutions: texts(SolutionOrigin::UserWritten),
                    existing_tools: non_empty(existing),
                    needed_tools: non_empty(needed),
                }
            })
            .collect();

        Self {
            workflow_title: workflow_title(state, catalog)
                .unwrap_or_else(|| "Untitled Workflow".to_string()),
            generated_on,
            score: state.score,
            badges: state.earned_badges.iter().copied().collect(),
            pain_points,
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# AI Workflow Enhancement Plan\n\n");
        out.push_str(&format!("## {}\n\n", self.workflow_title));
        out.push_str(&format!(
            "Generated on {}\n\n",
            self.generated_on.format("%B %-d, %Y")
        ));
        out.push_str(&format!("Detective score: {} points\n", self.score));
        if !self.badges.is_empty() {
            let badges: Vec<String> = self
                .badges
                .iter()
                .map(|b| format!("{} {}", b.icon(), b.title()))
                .collect();
            out.push_str(&format!("Badges: {}\n", badges.join(", ")));
        }

        out.push_str("\n## Identified Pain Points & Solutions\n");
        for pain in &self.pain_points {
            out.push_str(&format!("\n### Pain Point {}: {}\n\n", pain.number, pain.text));
            out.push_str(&format!("Severity: {}\n", pain.severity.label()));

            if !pain.has_solutions() {
                out.push_str("\n_No solutions defined yet_\n");
            }
            if !pain.ai_solutions.is_empty() {
                out.push_str("\n#### 🤖 AI-Suggested Solutions\n\n");
                for text in &pain.ai_solutions {
                    out.push_str(&format!("- {}\n", text));
                }
            }
            if !pain.user_solutions.is_empty() {
                out.push_str("\n#### ✍️ Your Custom Solutions\n\n");
                for text in &pain.user_solutions {
                    out.push_str(&format!("- {}\n", text));
                }
            }

            if pain.existing_tools.is_some() || pain.needed_tools.is_some() {
                out.push('\n');
            }
            if let Some(tools) = &pain.existing_tools {
                out.push_str(&format!("**Existing Tools:** {}\n", tools));
            }
            if let Some(tools) = &pain.needed_tools {
                out.push_str(&format!("**Additional Tools Needed:** {}\n", tools));
            }
        }

        out.push_str("\n## Recommended Next Steps\n\n");
        for (i, step) in NEXT_STEPS.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }
        out.push('\n');
        out.push_str(CLOSING_NOTE);
        out.push('\n');
        out
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Markdown => Ok(self.to_markdown()),
            ExportFormat::Json => self.to_json(),
        }
    }
}

/// Render the plan and write it into `dir`, creating the directory if
/// needed. Returns the written path.
pub fn write_plan(
    summary: &PlanSummary,
    dir: &Path,
    format: ExportFormat,
) -> Result<PathBuf, ExportError> {
    let contents = summary.render(format)?;
    let path = dir.join(format.file_name());

    let io_error = |source: std::io::Error| {
        warn!(path = ?path, error = %source, "plan_export_failed");
        ExportError::Io {
            path: path.display().to_string(),
            source,
        }
    };
    fs::create_dir_all(dir).map_err(io_error)?;
    fs::write(&path, contents).map_err(io_error)?;

    info!(
        path = ?path,
        format = format.label(),
        pain_points = summary.pain_points.len(),
        "plan_exported"
    );
    Ok(path)
}
