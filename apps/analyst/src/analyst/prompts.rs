//! Process analyst prompt template and its renderer.

use crate::models::{Task, TriggeringEvent};

use super::AnalystError;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// Persona half of the analyst system prompt.
const PROCESS_ANALYST_PERSONA: &str = "You are a process analyst for an autonomous \
    software development pipeline. You study workflow inefficiencies and propose \
    concrete, actionable changes to development phase instructions.";

/// System prompt for the process analyst: persona plus the shared JSON-only rules.
pub fn analyst_system_prompt() -> String {
    format!("{PROCESS_ANALYST_PERSONA} {JSON_ONLY_SYSTEM}")
}

const TRIGGERING_EVENT: &str = "{triggering_event}";
const TASKS: &str = "{tasks}";
const PROJECT_CONTEXT: &str = "{project_context}";

/// Process analyst prompt template.
/// Placeholders: {triggering_event}, {tasks}, {project_context}
pub const PROCESS_ANALYST_PROMPT_TEMPLATE: &str = r#"Analysis was triggered by the following workflow event:
{triggering_event}

Tasks related to this event, in order:
{tasks}

Overall project context:
{project_context}

Based on this information:
1. Analyze the root cause of the inefficiency.
2. Propose one specific, actionable change to the instructions of a single development phase.
3. Explain your reasoning.

Return a JSON object with EXACTLY these three string fields and nothing else:
{
  "phase_id": "the id of the phase whose instructions should change",
  "suggestion_text": "the proposed change to that phase's instructions",
  "reasoning": "why this change addresses the root cause"
}

HARD RULES:
1. All three fields are required and must be non-empty strings
2. Do NOT add any other fields
3. Target exactly one phase"#;

/// Renders the fixed analyst template for one invocation.
pub fn build_analyst_prompt(
    event: &TriggeringEvent,
    tasks: &[Task],
    project_context: &str,
) -> Result<String, AnalystError> {
    render_template(PROCESS_ANALYST_PROMPT_TEMPLATE, event, tasks, project_context)
}

/// Substitutes the three placeholders in a single left-to-right pass.
/// Placeholder-looking text inside the substituted values is left untouched,
/// and literal braces in the template (the JSON example) pass through.
pub(crate) fn render_template(
    template: &str,
    event: &TriggeringEvent,
    tasks: &[Task],
    project_context: &str,
) -> Result<String, AnalystError> {
    for placeholder in [TRIGGERING_EVENT, TASKS, PROJECT_CONTEXT] {
        if !template.contains(placeholder) {
            return Err(AnalystError::PromptFormat(format!(
                "template is missing the {placeholder} placeholder"
            )));
        }
    }

    let event_json = serde_json::to_string_pretty(event)
        .map_err(|e| AnalystError::PromptFormat(format!("failed to render event: {e}")))?;

    let descriptions: Vec<&str> = tasks
        .iter()
        .map(|t| t.enriched_description.as_str())
        .collect();
    let tasks_json = serde_json::to_string_pretty(&descriptions)
        .map_err(|e| AnalystError::PromptFormat(format!("failed to render tasks: {e}")))?;

    let substitutions = [
        (TRIGGERING_EVENT, event_json.as_str()),
        (TASKS, tasks_json.as_str()),
        (PROJECT_CONTEXT, project_context),
    ];

    let mut prompt = String::with_capacity(template.len() + event_json.len() + tasks_json.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        prompt.push_str(&rest[..open]);
        rest = &rest[open..];
        match substitutions
            .iter()
            .find(|(placeholder, _)| rest.starts_with(placeholder))
        {
            Some((placeholder, value)) => {
                prompt.push_str(value);
                rest = &rest[placeholder.len()..];
            }
            None => {
                prompt.push('{');
                rest = &rest[1..];
            }
        }
    }
    prompt.push_str(rest);

    Ok(prompt)
}
