//! Prompt templates: role tags and placeholders.
//!
//! A template may be split into chat messages with `<system>`, `<user>`
//! and `<assistant>` blocks; without tags the whole text is one user
//! message. Inside each message these placeholders are substituted:
//!
//! - `{input}`: the running value (the previous task's output, or the
//!   user's input for the first task)
//! - `{input_text}`: the user's original input
//! - `{task_N_output}`: the output of task N, counting from 1
//!
//! `{{` and `}}` produce literal braces. Any other `{...}` is left as is.

use crate::completion::{Message, Prompt, Role};
use crate::error::{Error, Result};

const TAGS: &[(Role, &str)] = &[
    (Role::System, "system"),
    (Role::User, "user"),
    (Role::Assistant, "assistant"),
];

/// Values available to a task's template.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    /// The running value.
    pub input: &'a str,
    /// The user's initial input.
    pub input_text: &'a str,
    /// Outputs of the tasks that already ran, in order.
    pub outputs: &'a [String],
}

/// Render a template into a prompt.
pub fn build_prompt(template: &str, bindings: &Bindings<'_>) -> Result<Prompt> {
    let mut messages = Vec::new();
    for (role, body) in split_roles(template)? {
        let content = render(body, bindings)?;
        if !content.trim().is_empty() {
            messages.push(Message::new(role, content));
        }
    }
    if messages.is_empty() {
        return Err(Error::Template("task renders to an empty prompt".to_string()));
    }
    Ok(Prompt { messages })
}

/// Split a template into `(role, body)` pairs. Text outside tags is
/// dropped when any tag is present.
pub fn split_roles(template: &str) -> Result<Vec<(Role, &str)>> {
    let mut parts = Vec::new();
    let mut rest = template;

    loop {
        let next = TAGS
            .iter()
            .filter_map(|(role, tag)| rest.find(&format!("<{tag}>")).map(|pos| (pos, *role, *tag)))
            .min_by_key(|(pos, _, _)| *pos);
        let Some((pos, role, tag)) = next else {
            break;
        };

        let body_start = pos + tag.len() + 2;
        let close = format!("</{tag}>");
        let Some(len) = rest[body_start..].find(&close) else {
            return Err(Error::Template(format!("<{tag}> is never closed")));
        };
        parts.push((role, rest[body_start..body_start + len].trim()));
        rest = &rest[body_start + len + close.len()..];
    }

    if parts.is_empty() {
        parts.push((Role::User, template.trim()));
    }
    Ok(parts)
}

/// Substitute placeholders in one message body.
pub fn render(text: &str, bindings: &Bindings<'_>) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        // `tail` starts with a single '{'.
        let Some(end) = tail[1..].find(['{', '}']) else {
            out.push_str(tail);
            rest = "";
            break;
        };
        let end = end + 1;
        if &tail[end..end + 1] == "{" {
            // `{` inside an unclosed `{`: emit the first one and rescan.
            out.push('{');
            rest = &tail[1..];
            continue;
        }

        let name = &tail[1..end];
        match resolve(name, bindings)? {
            Some(value) => out.push_str(value),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn resolve<'a>(name: &str, bindings: &Bindings<'a>) -> Result<Option<&'a str>> {
    match name {
        "input" => return Ok(Some(bindings.input)),
        "input_text" => return Ok(Some(bindings.input_text)),
        _ => {}
    }

    let Some(digits) = name
        .strip_prefix("task_")
        .and_then(|s| s.strip_suffix("_output"))
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
    else {
        return Ok(None);
    };
    let n: usize = digits
        .parse()
        .map_err(|_| Error::Template(format!("{{{name}}}: task number is too large")))?;

    if n == 0 {
        return Err(Error::Template(
            "{task_0_output}: tasks are numbered from 1".to_string(),
        ));
    }
    match bindings.outputs.get(n - 1) {
        Some(output) => Ok(Some(output.as_str())),
        None => Err(Error::Template(format!(
            "{{task_{n}_output}} is used before task {n} has run"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings<'a>(input: &'a str, outputs: &'a [String]) -> Bindings<'a> {
        Bindings {
            input,
            input_text: "original",
            outputs,
        }
    }

    #[test]
    fn substitutes_input() {
        let out = render("Summarize: {input}", &bindings("article", &[])).unwrap();
        assert_eq!(out, "Summarize: article");
    }

    #[test]
    fn substitutes_input_text_and_task_outputs() {
        let outputs = vec!["first".to_string(), "second".to_string()];
        let out = render(
            "{input_text} / {task_1_output} / {task_2_output}",
            &bindings("second", &outputs),
        )
        .unwrap();
        assert_eq!(out, "original / first / second");
    }

    #[test]
    fn forward_reference_is_an_error() {
        let outputs = vec!["first".to_string()];
        let err = render("{task_2_output}", &bindings("x", &outputs)).unwrap_err();
        assert!(err.to_string().contains("before task 2 has run"));
    }

    #[test]
    fn task_zero_is_an_error() {
        assert!(render("{task_0_output}", &bindings("x", &[])).is_err());
    }

    #[test]
    fn oversized_task_number_is_an_error() {
        let err =
            render("{task_99999999999999999999_output}", &bindings("x", &[])).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn non_numeric_task_name_is_kept() {
        let out = render("{task_x_output} {task__output}", &bindings("x", &[])).unwrap();
        assert_eq!(out, "{task_x_output} {task__output}");
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        let out = render(r#"Reply as {"answer": "{input}"}"#, &bindings("42", &[])).unwrap();
        assert_eq!(out, r#"Reply as {"answer": "42"}"#);
    }

    #[test]
    fn doubled_braces_are_literal() {
        let out = render("{{input}} is {input}", &bindings("v", &[])).unwrap();
        assert_eq!(out, "{input} is v");
    }

    #[test]
    fn unclosed_brace_is_kept() {
        let out = render("oops {input", &bindings("v", &[])).unwrap();
        assert_eq!(out, "oops {input");
    }

    #[test]
    fn stray_closing_brace_is_kept() {
        let out = render("a } b", &bindings("v", &[])).unwrap();
        assert_eq!(out, "a } b");
    }

    #[test]
    fn nested_open_brace_rescans() {
        let out = render("{ {input}", &bindings("v", &[])).unwrap();
        assert_eq!(out, "{ v");
    }

    #[test]
    fn substituted_value_is_not_rescanned() {
        let out = render("{input}", &bindings("{input_text}", &[])).unwrap();
        assert_eq!(out, "{input_text}");
    }

    #[test]
    fn untagged_template_is_one_user_message() {
        let prompt = build_prompt("  Summarize: {input}\n", &bindings("text", &[])).unwrap();
        assert_eq!(prompt, Prompt::user("Summarize: text"));
    }

    #[test]
    fn tagged_template_becomes_messages() {
        let template = "<system>\nYou are terse.\n</system>\n<user>\n{input}\n</user>";
        let prompt = build_prompt(template, &bindings("hello", &[])).unwrap();
        assert_eq!(
            prompt.messages,
            vec![
                Message::new(Role::System, "You are terse."),
                Message::new(Role::User, "hello"),
            ]
        );
    }

    #[test]
    fn tags_in_input_are_not_interpreted() {
        let prompt = build_prompt("<user>{input}</user>", &bindings("<system>x</system>", &[])).unwrap();
        assert_eq!(prompt.messages.len(), 1);
        assert_eq!(prompt.messages[0].content, "<system>x</system>");
    }

    #[test]
    fn unclosed_tag_is_an_error() {
        let err = split_roles("<user>hello").unwrap_err();
        assert!(err.to_string().contains("<user> is never closed"));
    }

    #[test]
    fn text_outside_tags_is_dropped() {
        let parts = split_roles("preamble <user>hi</user> trailer").unwrap();
        assert_eq!(parts, vec![(Role::User, "hi")]);
    }

    #[test]
    fn blank_rendered_prompt_is_an_error() {
        let prompt = build_prompt(
            "<system>only system {input}</system><user>{input}</user>",
            &bindings("", &[]),
        )
        .unwrap();
        assert_eq!(prompt.messages.len(), 1);
        assert_eq!(prompt.messages[0].role, Role::System);

        let err = build_prompt("{input}", &bindings("   ", &[])).unwrap_err();
        assert!(err.to_string().contains("empty prompt"));
    }

    #[test]
    fn assistant_tag_is_supported() {
        let parts = split_roles("<user>a</user><assistant>b</assistant><user>c</user>").unwrap();
        let roles: Vec<Role> = parts.iter().map(|(r, _)| *r).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    }
}
