//! Prompt builder for rendering the cited template.

use crate::templates::{CITED_TEMPLATE, NO_CONTEXT_NOTICE, SYSTEM_PROMPT};
use crate::types::{Citation, CitedPrompt, ContextPassage};
use handlebars::Handlebars;
use nucrag_core::{AppError, AppResult};
use serde_json::json;

/// Assemble the cited prompt for a query and its ranked passages.
///
/// Passages are quoted and cited in the order given. An empty passage list
/// still yields a complete prompt, with a notice in place of the context.
///
/// # Example
/// ```
/// use nucrag_prompt::{assemble, ContextPassage};
///
/// let passages = vec![ContextPassage {
///     chunk_id: 0,
///     page: 1,
///     link: "file:///docs/a.pdf#page=1".to_string(),
///     source_paragraph: "The reactor shall be designed with a containment.".to_string(),
/// }];
///
/// let prompt = assemble("What must the reactor have?", &passages).unwrap();
/// assert!(prompt.user.contains("> The reactor shall be designed"));
/// assert_eq!(prompt.citations.len(), 1);
/// ```
pub fn assemble(query: &str, passages: &[ContextPassage]) -> AppResult<CitedPrompt> {
    tracing::debug!("Assembling cited prompt with {} passages", passages.len());

    let citations: Vec<Citation> = passages.iter().map(Citation::from).collect();
    let sources: Vec<String> = citations.iter().map(Citation::to_markdown).collect();

    let data = json!({
        "query": query,
        "passages": passages,
        "sources": sources,
        "no_context": NO_CONTEXT_NOTICE,
    });

    let user = render_template(CITED_TEMPLATE, &data)?;

    Ok(CitedPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
        citations,
    })
}

/// Render a Handlebars template with data.
fn render_template(template: &str, data: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("cited", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("cited", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
