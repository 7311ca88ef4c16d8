use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::{AuditLogEntry, ALL_EMPLOYEES};

const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The request body carries at most this many characters of rendered log lines.
const PROMPT_DATA_LIMIT: usize = 15_000;

/// Shown whenever the remote call fails, whatever the cause. Remote errors
/// never propagate past this module's callers.
pub const SUMMARY_FALLBACK: &str =
    "There was an error generating the AI summary. Please check the error output for details.";

/// Narrow seam over the external text-generation service so callers and
/// tests can substitute a deterministic stub.
#[async_trait::async_trait]
pub trait Summarizer {
    async fn summarize(&self, logs: &[AuditLogEntry], employee: &str) -> anyhow::Result<String>;
}

/// Invokes the summarizer and converts any failure into the fixed fallback
/// message. Best effort, single attempt, no retry.
pub async fn generate_summary(
    summarizer: &dyn Summarizer,
    logs: &[AuditLogEntry],
    employee: &str,
) -> String {
    match summarizer.summarize(logs, employee).await {
        Ok(text) => text,
        Err(err) => {
            eprintln!("summary generation failed: {err:#}");
            SUMMARY_FALLBACK.to_string()
        }
    }
}

/// One narrative line per log entry, newline-joined, truncated to the first
/// 15 000 characters on a char boundary.
pub fn render_log_lines(logs: &[AuditLogEntry]) -> String {
    let joined = logs
        .iter()
        .map(|log| {
            format!(
                "On {}, {} audited {} calls, finding {} violations. \
                 They conducted {} coaching sessions and issued {} warning letters.",
                log.date.format("%Y-%m-%d"),
                log.employee_name,
                log.calls_audited,
                log.violations_caught,
                log.sessions_conducted,
                log.warning_letters_issued,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    joined.chars().take(PROMPT_DATA_LIMIT).collect()
}

pub fn build_prompt(logs: &[AuditLogEntry], employee: &str) -> String {
    let scope = if employee == ALL_EMPLOYEES {
        "all employees".to_string()
    } else {
        employee.to_string()
    };
    format!(
        "You are a QA Manager analyzing performance data for a telemarketing call center.\n\
         The following data represents QA logs for {scope}.\n\
         \n\
         Data:\n\
         {}\n\
         \n\
         Based on this data, provide a concise performance summary. Your summary should be \
         in markdown format and include:\n\
         1. An overall assessment of performance.\n\
         2. Identify any positive trends (e.g., high number of calls audited, low violations).\n\
         3. Identify any potential areas for concern (e.g., high violation rates, spikes in warnings).\n\
         4. Keep the summary to 3-4 short paragraphs.\n",
        render_log_lines(logs),
    )
}

/// The response is markdown-ish free text: blank lines are dropped and the
/// numbered assessment lines stand as items of their own.
pub fn summary_paragraphs(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect()
}

pub fn is_numbered_item(line: &str) -> bool {
    ["1.", "2.", "3.", "4."]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

/// Stand-in used when no API key is configured; every call reports failure
/// so the caller surfaces the fixed fallback instead.
pub struct UnconfiguredSummarizer;

#[async_trait::async_trait]
impl Summarizer for UnconfiguredSummarizer {
    async fn summarize(&self, _logs: &[AuditLogEntry], _employee: &str) -> anyhow::Result<String> {
        anyhow::bail!("summary service is not configured; set GEMINI_API_KEY")
    }
}

/// Production summarizer backed by the hosted Gemini endpoint.
pub struct GeminiSummarizer {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiSummarizer {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY must be set to generate summaries")?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, api_key })
    }
}

#[async_trait::async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, logs: &[AuditLogEntry], employee: &str) -> anyhow::Result<String> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: build_prompt(logs, employee),
                }],
            }],
        };
        let response = self
            .client
            .post(GEMINI_URL)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("summary request failed")?
            .error_for_status()
            .context("summary service returned an error status")?
            .json::<GenerateResponse>()
            .await
            .context("summary response was not valid JSON")?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .context("summary response carried no text")?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct StubSummarizer {
        reply: anyhow::Result<String>,
    }

    #[async_trait::async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(
            &self,
            _logs: &[AuditLogEntry],
            _employee: &str,
        ) -> anyhow::Result<String> {
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }
    }

    fn entry(date: &str, employee: &str) -> AuditLogEntry {
        AuditLogEntry {
            id: 1,
            date: date.parse().unwrap(),
            employee_name: employee.to_string(),
            tasks_performed: "Standard call auditing.".to_string(),
            calls_audited: 12,
            violations_caught: 2,
            sessions_conducted: 1,
            warning_letters_issued: 0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn log_lines_follow_the_narrative_template() {
        let lines = render_log_lines(&[entry("2024-01-05", "Alice Johnson")]);
        assert_eq!(
            lines,
            "On 2024-01-05, Alice Johnson audited 12 calls, finding 2 violations. \
             They conducted 1 coaching sessions and issued 0 warning letters."
        );
    }

    #[test]
    fn log_lines_truncate_at_limit() {
        let logs: Vec<AuditLogEntry> = (0..200)
            .map(|_| entry("2024-01-05", "Alice Johnson"))
            .collect();
        let lines = render_log_lines(&logs);
        assert_eq!(lines.chars().count(), 15_000);
    }

    #[test]
    fn prompt_names_the_employee_scope() {
        let logs = vec![entry("2024-01-05", "Alice Johnson")];
        assert!(build_prompt(&logs, "All").contains("QA logs for all employees"));
        assert!(build_prompt(&logs, "Jane Doe").contains("QA logs for Jane Doe"));
    }

    #[test]
    fn paragraphs_drop_blank_lines() {
        let text = "Overall solid month.\n\n1. Assessment first.\n\n2. Trends second.\n";
        let paragraphs = summary_paragraphs(text);
        assert_eq!(
            paragraphs,
            vec![
                "Overall solid month.",
                "1. Assessment first.",
                "2. Trends second."
            ]
        );
        assert!(!is_numbered_item(&paragraphs[0]));
        assert!(is_numbered_item(&paragraphs[1]));
    }

    #[tokio::test]
    async fn failures_become_the_fixed_fallback() {
        let stub = StubSummarizer {
            reply: Err(anyhow::anyhow!("remote unavailable")),
        };
        let text = generate_summary(&stub, &[], "All").await;
        assert_eq!(text, SUMMARY_FALLBACK);
    }

    #[tokio::test]
    async fn successful_replies_pass_through() {
        let stub = StubSummarizer {
            reply: Ok("A fine month.".to_string()),
        };
        let text = generate_summary(&stub, &[], "All").await;
        assert_eq!(text, "A fine month.");
    }
}
