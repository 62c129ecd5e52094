/*!
 * Prompt templates for line translation.
 *
 * Two system prompts exist: one for composite batch texts, which must keep
 * the separator lines intact, and one for lone lines.
 */

/// System prompt template with `{source_language}` and `{target_language}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Prompt for composite batch texts
    pub const BATCH_TRANSLATOR: &'static str = r#"You are a professional translator. Please translate the following {source_language} text into {target_language}.
Requirements:
1. Only provide the translation result, no explanations
2. Maintain the original format and structure, including the "---" separators
3. Keep proper nouns and technical terms accurate
4. Ensure the translation is natural and fluent in the target language
5. Preserve line breaks and separators exactly as they appear"#;

    /// Prompt for a single line
    pub const LINE_TRANSLATOR: &'static str = r#"You are a professional translator. Please translate the following {source_language} text into {target_language}.
Requirements:
1. Only provide the translation result, no explanations
2. Keep proper nouns and technical terms accurate
3. Ensure the translation is natural and fluent in the target language
4. If the text is empty or contains only special characters, return the original text"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Template for composite batch requests
    pub fn batch() -> Self {
        Self::new(Self::BATCH_TRANSLATOR)
    }

    /// Template for single-line requests
    pub fn single_line() -> Self {
        Self::new(Self::LINE_TRANSLATOR)
    }

    /// Render the template with the given language names.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}
