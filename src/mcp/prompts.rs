//! Research prompts offered alongside the tools.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Content;

/// Errors from prompt lookup and rendering
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("Prompt not found: {0}")]
    NotFound(String),

    #[error("Missing required argument '{argument}' for prompt '{prompt}'")]
    MissingArgument { prompt: String, argument: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// A prompt as listed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: Content,
}

/// A rendered prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

/// Validated arguments handed to a template
struct Args<'a>(&'a HashMap<String, String>);

impl Args<'_> {
    fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }

    fn get_or<'b>(&'b self, name: &str, default: &'b str) -> &'b str {
        match self.0.get(name).map(|v| v.trim()) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        }
    }
}

#[derive(Clone)]
struct PromptTemplate {
    prompt: Prompt,
    render: fn(&Args<'_>) -> String,
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

fn template(
    name: &str,
    description: &str,
    arguments: Vec<PromptArgument>,
    render: fn(&Args<'_>) -> String,
) -> PromptTemplate {
    PromptTemplate {
        prompt: Prompt {
            name: name.to_string(),
            description: description.to_string(),
            arguments,
        },
        render,
    }
}

fn argument(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        description: description.to_string(),
        required,
    }
}

/// Static registry of research prompts
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    templates: Vec<PromptTemplate>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self {
            templates: vec![
                template(
                    "deep-paper-analysis",
                    "Analyze an arXiv paper in depth using the paper tools",
                    vec![argument("paper_id", "arXiv ID of the paper to analyze", true)],
                    render_deep_analysis,
                ),
                template(
                    "research-discovery",
                    "Explore recent research on a topic",
                    vec![
                        argument("topic", "Research topic or question", true),
                        argument(
                            "expertise_level",
                            "beginner, intermediate or expert",
                            false,
                        ),
                        argument("time_period", "Time range to focus on, e.g. 2023-2024", false),
                    ],
                    render_discovery,
                ),
                template(
                    "paper-analysis",
                    "Analyze one aspect of a paper",
                    vec![
                        argument("paper_id", "arXiv ID of the paper", true),
                        argument(
                            "focus_area",
                            "methodology, results, theory, implementation or complete",
                            false,
                        ),
                    ],
                    render_paper_analysis,
                ),
                template(
                    "literature-synthesis",
                    "Synthesize findings across several papers",
                    vec![
                        argument("paper_ids", "Comma-separated arXiv IDs", true),
                        argument("synthesis_type", "themes, methods, timeline, gaps or comprehensive", false),
                    ],
                    render_synthesis,
                ),
                template(
                    "research-question",
                    "Formulate research questions from a set of papers",
                    vec![
                        argument("paper_ids", "Comma-separated arXiv IDs", true),
                        argument("topic", "Research topic the questions should address", true),
                    ],
                    render_research_question,
                ),
            ],
        }
    }

    /// All prompts in listing order
    pub fn all(&self) -> impl Iterator<Item = &Prompt> {
        self.templates.iter().map(|t| &t.prompt)
    }

    pub fn get(&self, name: &str) -> Option<&Prompt> {
        self.all().find(|p| p.name == name)
    }

    /// Render a prompt, checking that every required argument is present
    /// and non-blank
    pub fn render(
        &self,
        name: &str,
        arguments: &HashMap<String, String>,
    ) -> Result<PromptResult, PromptError> {
        let template = self
            .templates
            .iter()
            .find(|t| t.prompt.name == name)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))?;

        if let Some(missing) = template.prompt.arguments.iter().find(|arg| {
            arg.required
                && arguments
                    .get(&arg.name)
                    .map_or(true, |value| value.trim().is_empty())
        }) {
            return Err(PromptError::MissingArgument {
                prompt: name.to_string(),
                argument: missing.name.clone(),
            });
        }

        let text = (template.render)(&Args(arguments));
        Ok(PromptResult {
            description: template.prompt.description.clone(),
            messages: vec![PromptMessage {
                role: Role::User,
                content: Content::text(text),
            }],
        })
    }
}

fn render_deep_analysis(args: &Args<'_>) -> String {
    let id = args.get("paper_id");
    format!(
        "Analyze arXiv paper {id} in depth.\n\n\
         1. Call download_paper with paper_id \"{id}\" if it is not stored yet, then read_paper.\n\
         2. Summarize the problem, the approach and the main contributions.\n\
         3. Assess the methodology: assumptions, experimental setup, baselines.\n\
         4. Report the key results and how well the evidence supports them.\n\
         5. List limitations and open questions.\n\
         6. Use search_papers to place the work among related papers and note follow-up directions."
    )
}

fn render_discovery(args: &Args<'_>) -> String {
    let topic = args.get("topic");
    let level = args.get_or("expertise_level", "intermediate");
    let period = args.get_or("time_period", "the last few years");
    format!(
        "Help me explore research on \"{topic}\" at a {level} level, focusing on {period}.\n\n\
         Use search_papers to find relevant arXiv papers (use date_from/date_to for the period). \
         Group the results into themes, point out the most influential or recent work, \
         and suggest which papers to download and read first."
    )
}

fn render_paper_analysis(args: &Args<'_>) -> String {
    let id = args.get("paper_id");
    let focus = args.get_or("focus_area", "complete");
    format!(
        "Analyze arXiv paper {id} with a focus on: {focus}.\n\n\
         Download the paper with download_paper if needed and read it with read_paper. \
         Quote the relevant sections and explain them for that focus, then give an overall assessment."
    )
}

fn render_synthesis(args: &Args<'_>) -> String {
    let ids = split_ids(args.get("paper_ids"));
    let kind = args.get_or("synthesis_type", "comprehensive");
    format!(
        "Produce a {kind} synthesis of these arXiv papers: {}.\n\n\
         Make sure each paper is downloaded (download_paper) and read (read_paper). \
         Compare their questions, methods and findings, identify agreements and contradictions, \
         and finish with the gaps that remain open.",
        ids.join(", ")
    )
}

fn render_research_question(args: &Args<'_>) -> String {
    let ids = split_ids(args.get("paper_ids"));
    let topic = args.get("topic");
    format!(
        "Using arXiv papers {} as the starting point, formulate research questions about \"{topic}\".\n\n\
         Read each paper first (download_paper, then read_paper). For every question, state why it \
         is open, which paper motivates it and how it could be investigated.",
        ids.join(", ")
    )
}

fn split_ids(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
