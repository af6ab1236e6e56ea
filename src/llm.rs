use std::time::Duration;

use serde_json::{Map, Value};

use crate::{env_optional, env_required, env_u64};

/// Fixed reply when answer generation fails for any reason.
pub(crate) const ANSWER_FAILURE_TEXT: &str =
    "I'm sorry, I encountered an error generating the response from the AI model.";

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

const ANSWER_SYSTEM_PROMPT: &str = "\
You are an intelligent and friendly IoT Device Assistant. You have access to \
the COMPLETE real-time state of the device in JSON format, including \
timestamps for when data was last updated.\n\n\
**Your Instructions:**\n\
1. **Be User-Friendly**: Translate technical keys into normal English (e.g., 'ac_status' -> 'AC Power Status', 'batt' -> 'Battery').\n\
2. **Summarize**: If the answer involves a large JSON object (like camera lists or configs), do NOT dump the raw JSON. Summarize it (e.g., 'There are 3 cameras online: Cam1, Cam2...').\n\
3. **Check Timestamps**: If asked about status, mention if the data looks old or stale based on the '_updated_at' fields provided.\n\
4. **Format**: Use Markdown (bolding, lists) to make the response easy to read.\n\
5. **Context**: Use the provided context data effectively. If the answer is not in the data, frankly admit it.";

pub(crate) struct LlmConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) max_tokens: u64,
    pub(crate) version: String,
    pub(crate) timeout_secs: u64,
}

impl LlmConfig {
    pub(crate) fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(LlmConfig {
            api_key: env_required("ANTHROPIC_API_KEY")?,
            model: env_optional("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: env_optional("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_tokens: env_u64("ANTHROPIC_MAX_TOKENS", 1024)?,
            version: env_optional("ANTHROPIC_VERSION").unwrap_or_else(|| "2023-06-01".to_string()),
            timeout_secs: env_u64("ANTHROPIC_TIMEOUT", 120)?,
        })
    }
}

/// Single-turn chat completion: one optional system prompt, one user message,
/// text reply. No retries, no streaming.
pub(crate) fn complete(
    cfg: &LlmConfig,
    system: Option<&str>,
    user: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut payload = serde_json::json!({
        "model": cfg.model,
        "max_tokens": cfg.max_tokens,
        "messages": [{
            "role": "user",
            "content": [{"type": "text", "text": user}]
        }],
    });
    if let Some(system) = system {
        payload["system"] = serde_json::json!(system);
    }

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(cfg.timeout_secs))
        .timeout_read(Duration::from_secs(cfg.timeout_secs))
        .timeout_write(Duration::from_secs(cfg.timeout_secs))
        .build();

    let response = agent
        .post(&cfg.base_url)
        .set("content-type", "application/json")
        .set("x-api-key", &cfg.api_key)
        .set("anthropic-version", &cfg.version)
        .send_json(payload);

    let body = match response {
        Ok(resp) => resp.into_string()?,
        Err(ureq::Error::Status(code, resp)) => {
            let text = resp.into_string().unwrap_or_default();
            return Err(format!("completion failed: {code} {text}").into());
        }
        Err(ureq::Error::Transport(err)) => {
            return Err(format!("completion transport error: {err}").into());
        }
    };
    let parsed: Value = serde_json::from_str(&body)?;
    extract_text(&parsed).ok_or_else(|| "completion response missing text content".into())
}

fn extract_text(payload: &Value) -> Option<String> {
    let content = payload.get("content")?.as_array()?;
    let mut parts = Vec::new();
    for block in content {
        if block.get("type").and_then(|t| t.as_str()) != Some("text") {
            continue;
        }
        if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
    }
    if parts.is_empty() { None } else { Some(parts.join("\n")) }
}

/// Compose the final answer from the aggregated context. Always returns
/// something to show the user; failures degrade to a fixed apology.
pub(crate) fn answer_question(
    cfg: &LlmConfig,
    question: &str,
    context: &Map<String, Value>,
    chart_key: Option<&str>,
) -> String {
    let mut system = ANSWER_SYSTEM_PROMPT.to_string();
    if let Some(key) = chart_key {
        system.push_str(&format!(
            "\n\n[NOTE]: A line chart for '{key}' has been generated and shown to the user. \
             You should mention: 'I've plotted the trend for {key} below.'"
        ));
    }
    let context_json = Value::Object(context.clone()).to_string();
    let user = format!("Device Context: {context_json}\n\nUser Question: {question}");

    match complete(cfg, Some(&system), &user) {
        Ok(answer) => answer,
        Err(err) => {
            eprintln!("[llm] answer generation failed: {err}");
            ANSWER_FAILURE_TEXT.to_string()
        }
    }
}
