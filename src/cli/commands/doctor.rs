//! Doctor command - verify system requirements and configuration.

use crate::cli::preflight::check_tool;
use crate::cli::Output;
use crate::config::{GeneratorProvider, Settings};
use crate::openai::is_api_key_configured;
use console::style;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
///
/// `config_path` is the file passed with `--config`, if any.
pub async fn run_doctor(settings: &Settings, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    Output::header("ytblog Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_check = check_yt_dlp(&settings.transcript.yt_dlp);
    tool_check.print();
    checks.push(tool_check);

    println!();

    println!("{}", style("Text Generator").bold());
    let generator_check = match settings.generator.provider {
        GeneratorProvider::OpenAI => check_openai_api_key(),
        GeneratorProvider::Ollama => check_ollama(&settings.generator.ollama_url).await,
    };
    generator_check.print();
    checks.push(generator_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(&config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using ytblog.",
            errors
        ));
    } else if warnings > 0 {
        Output::warning(&format!("{} warning(s). ytblog should work.", warnings));
    } else {
        Output::success("All checks passed!");
    }

    Ok(())
}

fn check_yt_dlp(binary: &str) -> CheckResult {
    match check_tool(binary) {
        Ok(()) => CheckResult::ok("yt-dlp", &format!("{} is available", binary)),
        Err(e) => CheckResult::error(
            "yt-dlp",
            &e.to_string(),
            "Install with: pip install yt-dlp (or brew install yt-dlp)",
        ),
    }
}

fn check_openai_api_key() -> CheckResult {
    if is_api_key_configured() {
        CheckResult::ok("OpenAI", "OPENAI_API_KEY is set")
    } else {
        CheckResult::error(
            "OpenAI",
            "OPENAI_API_KEY not set",
            "export OPENAI_API_KEY='sk-...'",
        )
    }
}

async fn check_ollama(base_url: &str) -> CheckResult {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => return CheckResult::error("Ollama", &e.to_string(), "Check your TLS setup"),
    };

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            CheckResult::ok("Ollama", &format!("Reachable at {}", base_url))
        }
        Ok(response) => CheckResult::warning(
            "Ollama",
            &format!("{} answered with {}", base_url, response.status()),
            "Check generator.ollama_url in your config",
        ),
        Err(_) => CheckResult::error(
            "Ollama",
            &format!("Not reachable at {}", base_url),
            "Start it with: ollama serve",
        ),
    }
}

fn check_config_file(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::warning(
            "Config file",
            "Using defaults (no config file)",
            "Run 'ytblog config edit' to create one",
        );
    }

    match Settings::load_from(Some(&path.to_path_buf())) {
        Ok(_) => CheckResult::ok("Config file", &path.display().to_string()),
        Err(e) => CheckResult::error(
            "Config file",
            &format!("Invalid config: {}", e),
            &format!("Fix or remove {}", path.display()),
        ),
    }
}
