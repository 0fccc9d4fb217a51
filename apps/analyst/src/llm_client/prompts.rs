// Prompt fragments shared by every caller of the LLM client.
// Task-specific templates live next to the code that renders them.

/// Output discipline appended to every system prompt that expects JSON back.
pub const JSON_ONLY_SYSTEM: &str = "Answer with a single valid JSON object and nothing else: \
    no prose before or after it, no markdown code fences, no comments.";
