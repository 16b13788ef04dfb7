use std::path::{Path, PathBuf};

use shipwright_core::{Feature, IssueStatus, Requirements, StageId, WorkflowRecord};
use tracing::{info, warn};

use super::{missing, notify};
use crate::context::PipelineContext;
use crate::error::StageError;
use crate::stage::Stage;

struct FeatureRule {
    feature: Feature,
    keywords: &'static [&'static str],
    functional: &'static str,
    ui_change: &'static str,
    technical: &'static str,
    create: &'static [&'static str],
    modify: &'static [&'static str],
}

const FEATURE_RULES: &[FeatureRule] = &[
    FeatureRule {
        feature: Feature::Export,
        keywords: &["export", "download", "csv"],
        functional: "Export the task list to a downloadable CSV file",
        ui_change: "Add an export button next to the task list",
        technical: "Serialize tasks to CSV on the client",
        create: &["components/ExportButton.jsx"],
        modify: &["App.jsx", "App.css"],
    },
    FeatureRule {
        feature: Feature::Search,
        keywords: &["search", "filter"],
        functional: "Filter tasks by a search query",
        ui_change: "Add a search bar above the task list",
        technical: "Keep the query in component state and filter on render",
        create: &["components/SearchBar.jsx"],
        modify: &["App.jsx", "App.css"],
    },
    FeatureRule {
        feature: Feature::Notification,
        keywords: &["notification", "alert", "due date"],
        functional: "Notify users about tasks that are due soon",
        ui_change: "Show an alert banner for due tasks",
        technical: "Compare due dates against the current date when rendering",
        create: &[],
        modify: &["App.jsx", "App.css"],
    },
    FeatureRule {
        feature: Feature::Styling,
        keywords: &["color", "priority", "style"],
        functional: "Distinguish tasks visually by priority",
        ui_change: "Colour-code tasks by priority",
        technical: "Add priority modifier classes to the stylesheet",
        create: &[],
        modify: &["App.css"],
    },
];

/// Extracts requirements from the issue text with keyword rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeStage;

impl Stage for AnalyzeStage {
    fn id(&self) -> StageId {
        StageId::Analyze
    }

    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError> {
        let identity = record
            .identity()
            .ok_or_else(|| missing(StageId::Analyze, "a verified identity"))?;
        let text = format!("{} {}", identity.description(), identity.summary()).to_lowercase();
        let source_root = ctx.config().frontend_path().join("src");

        let requirements = analyze(&text, identity.summary(), &source_root);
        if requirements.features.is_empty() {
            warn!("no known feature keywords in issue text");
        }
        info!(
            features = requirements.features.len(),
            files_to_create = requirements.files_to_create.len(),
            files_to_modify = requirements.files_to_modify.len(),
            "requirements analyzed"
        );

        let comment = format!(
            "Requirements analyzed: {} functional, {} files to create, {} to modify",
            requirements.functional.len(),
            requirements.files_to_create.len(),
            requirements.files_to_modify.len()
        );
        record.set_requirements(requirements);
        notify(ctx, record, IssueStatus::InProgress, comment);
        Ok(())
    }
}

fn analyze(text: &str, summary: &str, source_root: &Path) -> Requirements {
    let mut requirements = Requirements::default();

    for rule in FEATURE_RULES {
        if !rule.keywords.iter().any(|keyword| text.contains(keyword)) {
            continue;
        }
        requirements.features.push(rule.feature);
        requirements.functional.push(rule.functional.to_string());
        requirements.ui_changes.push(rule.ui_change.to_string());
        requirements.technical.push(rule.technical.to_string());
        for file in rule.create {
            push_unique(&mut requirements.files_to_create, source_root.join(file));
        }
        for file in rule.modify {
            push_unique(&mut requirements.files_to_modify, source_root.join(file));
        }
    }

    if requirements.features.is_empty() {
        requirements.functional.push(summary.to_string());
    }
    requirements
}

fn push_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}
