use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use shipwright_core::{IssueIdentity, PlanTarget, TargetKind};
use tracing::debug;

use crate::traits::{CodeGenerator, GeneratedFiles, GenerationFailure, GenerationRequest};

/// Offline generator producing skeletal content for each plan target.
///
/// New files get a minimal component or stylesheet; existing files are read
/// and get a marked block appended, so nothing the project had is lost.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateCodeGenerator;

impl TemplateCodeGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CodeGenerator for TemplateCodeGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedFiles, GenerationFailure> {
        let mut files = GeneratedFiles::new();

        for target in &request.plan.targets {
            let content = match target.kind {
                TargetKind::Create => new_file(target, request.identity),
                TargetKind::Modify => {
                    let existing = read_existing(request.project_root, target)
                        .map_err(|message| {
                            GenerationFailure::new(message).with_partial(files.clone())
                        })?;
                    appended(&existing, target, request.identity)
                }
            };
            debug!(path = %target.path.display(), kind = ?target.kind, "generated");
            files.insert(target.path.clone(), content);
        }
        Ok(files)
    }
}

fn read_existing(project_root: &Path, target: &PlanTarget) -> Result<String, String> {
    match fs::read_to_string(project_root.join(&target.path)) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(format!("cannot read {}: {e}", target.path.display())),
    }
}

fn extension(target: &PlanTarget) -> &str {
    target
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
}

fn new_file(target: &PlanTarget, identity: &IssueIdentity) -> String {
    let name = target
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Component");
    match extension(target) {
        "css" => format!(
            "/* {}: {} */\n.{} {{}}\n",
            identity.key(),
            identity.summary(),
            css_class(name)
        ),
        "jsx" | "tsx" | "js" | "ts" => format!(
            "// {key}: {summary}\n\
             export default function {name}() {{\n  \
               return <div className=\"{class}\" />;\n\
             }}\n",
            key = identity.key(),
            summary = identity.summary(),
            class = css_class(name),
        ),
        _ => format!("{}: {}\n", identity.key(), identity.summary()),
    }
}

fn appended(existing: &str, target: &PlanTarget, identity: &IssueIdentity) -> String {
    let block = match extension(target) {
        "css" => format!("/* {}: {} */\n", identity.key(), identity.summary()),
        "jsx" | "tsx" | "js" | "ts" => format!("// {}: {}\n", identity.key(), identity.summary()),
        _ => format!("{}: {}\n", identity.key(), identity.summary()),
    };
    let mut content = existing.to_string();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&block);
    content
}

/// `SearchBar` -> `search-bar`.
fn css_class(name: &str) -> String {
    let mut class = String::new();
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                class.push('-');
            }
            class.push(ch.to_ascii_lowercase());
        } else {
            class.push(ch);
        }
    }
    class
}
