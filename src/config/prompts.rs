//! Prompt templates for ytblog.
//!
//! Prompts can be customized by placing a `blog.toml` file in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub blog: BlogPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the summarize, draft and revise stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPrompts {
    /// Receives `{{transcript}}`.
    pub summarize: String,
    /// Receives `{{summary}}`.
    pub draft: String,
    /// Receives `{{draft}}` and `{{feedback}}`.
    pub revise: String,
}

impl Default for BlogPrompts {
    fn default() -> Self {
        Self {
            summarize: r#"Summarize the following YouTube transcript while maintaining key insights:

{{transcript}}

Keep it concise and structured."#
                .to_string(),

            draft: r#"Convert the following summarized transcript into a well-structured blog post:

{{summary}}

The blog should be engaging, informative, and well-structured with an introduction, key takeaways, and a conclusion.
If any code is explained, include the code snippet verbatim in the blog post and briefly explain what it does."#
                .to_string(),

            revise: r#"Here is a blog post:

{{draft}}

The reviewer has given the following feedback:
"{{feedback}}"

Please improve the blog post based on this feedback."#
                .to_string(),
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid regex"))
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let blog_path = custom_path.join("blog.toml");
            if blog_path.exists() {
                let content = std::fs::read_to_string(&blog_path)?;
                prompts.blog = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass: text inserted for one placeholder is
    /// never scanned for further placeholders. Unknown placeholders are left as-is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.blog.summarize.contains("{{transcript}}"));
        assert!(prompts.blog.draft.contains("{{summary}}"));
        assert!(prompts.blog.revise.contains("{{draft}}"));
        assert!(prompts.blog.revise.contains("{{feedback}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_inserted_text() {
        let mut vars = HashMap::new();
        vars.insert("draft".to_string(), "Use {{feedback}} literally".to_string());
        vars.insert("feedback".to_string(), "shorter".to_string());

        let result = Prompts::render("{{draft}} / {{feedback}}", &vars);
        assert_eq!(result, "Use {{feedback}} literally / shorter");
    }

    #[test]
    fn test_custom_variables_are_overridden_by_call_vars() {
        let mut custom = HashMap::new();
        custom.insert("audience".to_string(), "beginners".to_string());
        custom.insert("summary".to_string(), "ignored".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("summary".to_string(), "real".to_string());

        let result = prompts.render_with_custom("{{summary}} for {{audience}} {{unknown}}", &vars);
        assert_eq!(result, "real for beginners {{unknown}}");
    }

    #[test]
    fn test_load_custom_blog_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("blog.toml"),
            "summarize = \"Short: {{transcript}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.blog.summarize, "Short: {{transcript}}");
        assert_eq!(prompts.blog.draft, BlogPrompts::default().draft);
    }
}
