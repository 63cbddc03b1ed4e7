// Shared prompt fragments. Each service that calls the LLM keeps its own
// prompts.rs alongside it; only cross-cutting pieces live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps answers tied to the supplied site records.
pub const GROUNDING_INSTRUCTION: &str = "\
    Only use facts present in the site log records provided in the context. \
    If the records do not contain the answer, say so plainly instead of guessing. \
    Refer to records by time and location when citing them.";
