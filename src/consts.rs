//! Project-wide constants.

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
pub const SERPAPI_URL: &str = "https://serpapi.com/search.json";

/// Default model per provider when none is specified.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Suggested first task: restate the raw input.
pub const EXAMPLE_FIRST_TASK: &str = "<system>
You always echo what USER says in Shakespearean English.
</system>
<user>
{input_text}
</user>";

/// Suggested follow-up task: build on the first task's output.
pub const EXAMPLE_NEXT_TASK: &str = "<system>
You are an amazing playwright.
</system>
<user>
Please write the first two paragraphs of a play inspired by:
{task_1_output}
</user>";

/// Format a number with comma separators (e.g. 1,234,567).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consts_from_cargo_toml() {
        assert!(AUTHOR.contains("Assaf Sapir"));
        assert!(HOMEPAGE.contains("sapir.io"));
        assert!(REPO.contains("promptline"));
    }

    #[test]
    fn examples_reference_placeholders() {
        assert!(EXAMPLE_FIRST_TASK.contains("{input_text}"));
        assert!(EXAMPLE_NEXT_TASK.contains("{task_1_output}"));
    }

    #[test]
    fn format_number_small() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
    }

    #[test]
    fn format_number_thousands() {
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(123_456), "123,456");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
