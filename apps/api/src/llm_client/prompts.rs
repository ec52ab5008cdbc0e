// Shared prompt constants for every completion call.
// Task-specific templates live in completion/prompts.rs.

/// System prompt that enforces JSON-only output and frames the assistant's role.
pub const JSON_ONLY_SYSTEM: &str = "You periodically analyze an evolving blog draft \
    and refine keyword suggestions for its author. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
