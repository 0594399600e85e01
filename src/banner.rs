//! Startup banner and session summary display.

use crate::completion::TokenUsage;
use crate::consts::{AUTHOR, HOMEPAGE, REPO, format_number};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub search: &'a str,
    pub tasks: usize,
    pub missing_keys: &'a [&'a str],
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    let keys = if info.missing_keys.is_empty() {
        "✓".to_string()
    } else {
        format!("missing {}", info.missing_keys.join(", "))
    };
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║          P R O M P T L I N E          ║
   ║     one prompt feeding the next       ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   provider  {} ({})
   search    {}
   keys      {}
   tasks     {}

   type /help for commands
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.provider,
        info.model,
        info.search,
        keys,
        info.tasks,
    );
}

/// Print the session summary (token usage + farewell).
pub fn print_session_summary(usage: TokenUsage) {
    if usage.total() > 0 {
        println!(
            "session: {:>6} input + {:>6} output = {:>6} tokens",
            format_number(usage.input_tokens),
            format_number(usage.output_tokens),
            format_number(usage.total()),
        );
    }
    println!("goodbye.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_banner_does_not_panic() {
        print_banner(&BannerInfo {
            provider: "openai",
            model: "gpt-4o-mini",
            search: "serpapi",
            tasks: 0,
            missing_keys: &["SERPAPI_API_KEY"],
        });
    }

    #[test]
    fn print_session_summary_with_tokens() {
        print_session_summary(TokenUsage {
            input_tokens: 1234,
            output_tokens: 567,
        });
    }

    #[test]
    fn print_session_summary_zero_tokens() {
        print_session_summary(TokenUsage::default());
    }
}
