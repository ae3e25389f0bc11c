//! Model name resolution.

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Short name aliases for Gemini image models.
const ALIASES: &[(&str, &str)] = &[
    ("nano-banana", "gemini-2.5-flash-image"),
    ("nano-banana-pro", "gemini-3-pro-image-preview"),
];

/// Resolve a model name (alias or exact) to the full model identifier.
#[must_use]
pub fn resolve_model(name: &str) -> String {
    ALIASES
        .iter()
        .find(|&&(alias, _)| alias == name)
        .map_or_else(|| name.to_string(), |&(_, full)| full.to_string())
}

/// Check that a resolved model can serve `generateContent` image edits.
///
/// # Errors
///
/// Returns an error if the name is not a Gemini model.
pub fn validate_model(model: &str) -> Result<(), String> {
    if model.starts_with("gemini-") && model.len() > "gemini-".len() {
        Ok(())
    } else {
        Err(format!(
            "Unknown model '{model}'. Expected 'nano-banana', 'nano-banana-pro' or a 'gemini-*' model."
        ))
    }
}
