//! Image-generation collaborator boundary.
//!
//! The generator takes a free-text prompt and returns an image reference, or
//! nothing. Absence is a silent failure by contract — the UI simply keeps
//! the placeholder, so there is no error type here.

/// External image-generation collaborator.
pub trait ImageGenerator: Send + Sync {
    /// Returns an image reference (URL or data URI) for the prompt, or
    /// `None` when generation is unavailable or failed.
    fn generate(&self, prompt: &str) -> Option<String>;
}

/// Stand-in used when no generation collaborator is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledImageGenerator;

impl ImageGenerator for DisabledImageGenerator {
    fn generate(&self, _prompt: &str) -> Option<String> {
        None
    }
}

/// Prompt shape used when generating a goal icon from its text fields.
pub fn goal_image_prompt(title: &str, description: &str) -> String {
    format!("Icon for: {title}. {description}")
}

#[cfg(test)]
mod tests {
    use super::{goal_image_prompt, DisabledImageGenerator, ImageGenerator};

    #[test]
    fn disabled_generator_fails_silently() {
        assert!(DisabledImageGenerator.generate("Icon for: gym.").is_none());
    }

    #[test]
    fn prompt_includes_title_and_description() {
        assert_eq!(
            goal_image_prompt("Coffee card", "10 stamps"),
            "Icon for: Coffee card. 10 stamps"
        );
    }
}
