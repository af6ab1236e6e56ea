use chrono::Utc;

use crate::{
    ChartPayload, ChartPoint, DEFAULT_HISTORY_LIMIT, LlmConfig, TelemetrySession, complete,
};

/// Question substrings that imply the user wants a plotted series.
pub(crate) const CHART_TRIGGER_WORDS: [&str; 5] = ["chart", "graph", "trend", "history", "plot"];

/// How far back the plotted window reaches from now.
pub(crate) const HISTORY_WINDOW_SECS: i64 = 24 * 3600;

pub(crate) fn wants_chart(question: &str) -> bool {
    let question = question.to_lowercase();
    CHART_TRIGGER_WORDS.iter().any(|word| question.contains(word))
}

fn key_selection_prompt(question: &str, keys: &[String]) -> String {
    format!(
        "User asked: '{question}'. Available keys: [{}]. Identify the single most relevant \
         telemetry key to plot. Return ONLY the key name. If none match, return 'None'.",
        keys.join(", ")
    )
}

// The model may answer the 'None' sentinel, or invent a key that was never
// discovered. Only a literal member of the discovered list is plottable.
fn accept_model_key(reply: &str, keys: &[String]) -> Option<String> {
    let candidate = reply.trim();
    keys.iter().find(|k| k.as_str() == candidate).cloned()
}

fn select_chart_key(cfg: &LlmConfig, question: &str, keys: &[String]) -> Option<String> {
    if keys.is_empty() {
        return None;
    }
    let prompt = key_selection_prompt(question, keys);
    let reply = match complete(cfg, None, &prompt) {
        Ok(reply) => reply,
        Err(err) => {
            eprintln!("[chart] key selection failed: {err}");
            return None;
        }
    };
    accept_model_key(&reply, keys)
}

/// Build the chart payload for a question, or nothing. Nothing is also the
/// answer for every failure along the way — a missing chart must never block
/// answer generation.
pub(crate) fn extract_chart(
    session: &TelemetrySession,
    cfg: &LlmConfig,
    device_id: &str,
    question: &str,
    timeseries_keys: &[String],
) -> Option<ChartPayload> {
    if !wants_chart(question) {
        return None;
    }
    let key = select_chart_key(cfg, question, timeseries_keys)?;

    let end = Utc::now().timestamp();
    let start = end - HISTORY_WINDOW_SECS;
    let mut history = match session.get_history(
        device_id,
        std::slice::from_ref(&key),
        start,
        end,
        DEFAULT_HISTORY_LIMIT,
    ) {
        Ok(history) => history,
        Err(err) => {
            eprintln!("[chart] history fetch failed for '{key}': {err}");
            return None;
        }
    };

    let samples = history.remove(&key)?;
    Some(ChartPayload {
        label: key,
        points: samples.into_iter().map(|s| ChartPoint { t: s.ts, y: s.value }).collect(),
    })
}

// ── Tests ───────────────────────────────────────────────────────────────
