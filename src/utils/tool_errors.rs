use crate::errors::ToolError;
use crate::utils::suggest::suggest;

/// Error for a tool name routed to a manager that does not serve it.
pub fn unknown_tool_error(family: &str, tool: &str, known_tools: &[&str]) -> ToolError {
    let known: Vec<String> = known_tools.iter().map(|s| s.to_string()).collect();
    let suggestions = suggest(tool, &known, 3);
    let mut hint = format!("{} tools: {}.", family, known.join(", "));
    if !suggestions.is_empty() {
        hint = format!("Did you mean: {}? {}", suggestions.join(", "), hint);
    }
    ToolError::invalid_params(format!("Unknown {} tool: {}", family, tool))
        .with_hint(hint)
        .with_details(serde_json::json!({
            "known_tools": known,
            "did_you_mean": suggestions,
        }))
}
