use std::io::{self, Read};
use std::sync::Arc;

use serde_json::{self, Value};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::{
    AskRequest, AskResponse, LlmConfig, SeriesMap, TelemetrySession, answer_question,
    collect_telemetry, device_snapshot, extract_chart, plain_text, value_as_f64,
};

const ALARM_KEY: &str = "alarmCount";
const BATTERY_KEY: &str = "battery_status";
const LOW_BATTERY_THRESHOLD: f64 = 20.0;

pub(crate) fn run_server(
    bind: &str,
    port: u16,
    session: Arc<TelemetrySession>,
    llm: LlmConfig,
    device_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{bind}:{port}");
    let server = Server::http(&addr)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("server: {e}")))?;
    eprintln!("devicetalk listening on http://{addr}");

    for request in server.incoming_requests() {
        let path = request.url().split('?').next().unwrap_or("/").to_string();
        match (request.method().clone(), path.as_str()) {
            (Method::Get, "/") => respond_text(request, 200, "devicetalk: device Q&A service"),
            (Method::Get, "/health") => {
                respond_json(request, 200, serde_json::json!({"status": "ok"}))
            }
            (Method::Get, "/token") => handle_token(request, &session),
            (Method::Get, "/alerts") => handle_alerts(request, &session, device_id),
            (Method::Post, "/ask") => handle_ask(request, &session, &llm, device_id),
            _ => respond_text(request, 404, "not found"),
        }
    }
    Ok(())
}

pub(crate) fn parse_json_body(request: &mut Request) -> Result<Value, String> {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .map_err(|e| format!("read body: {e}"))?;
    if body.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(&body).map_err(|e| format!("json: {e}"))
}

fn handle_token(request: Request, session: &TelemetrySession) {
    // Refresh-if-needed, same path the reads take.
    match session.bearer_header() {
        Ok(_) => {
            let (token, expiry_at) = session.token_info();
            respond_json(
                request,
                200,
                serde_json::json!({
                    "status": "success",
                    "token": token,
                    "expiry_at": expiry_at,
                }),
            );
        }
        Err(err) => {
            eprintln!("[server] token refresh failed: {err}");
            respond_json(
                request,
                401,
                serde_json::json!({
                    "status": "error",
                    "message": "Failed to authenticate with telemetry platform",
                }),
            );
        }
    }
}

/// Threshold checks over the latest alarm and battery samples. Anything
/// unreadable simply does not alert.
fn evaluate_alerts(telemetry: &SeriesMap) -> Vec<String> {
    let mut alerts = Vec::new();

    if let Some(sample) = telemetry.get(ALARM_KEY).and_then(|s| s.first()) {
        if value_as_f64(&sample.value).is_some_and(|count| count > 0.0) {
            alerts.push(format!(
                "Warning: {} active alarms detected!",
                plain_text(&sample.value)
            ));
        }
    }

    if let Some(sample) = telemetry.get(BATTERY_KEY).and_then(|s| s.first()) {
        if value_as_f64(&sample.value).is_some_and(|level| level < LOW_BATTERY_THRESHOLD) {
            alerts.push(format!("Critical: Battery is low ({}%)", plain_text(&sample.value)));
        }
    }

    alerts
}

fn handle_alerts(request: Request, session: &TelemetrySession, device_id: &str) {
    let keys = [ALARM_KEY.to_string(), BATTERY_KEY.to_string()];
    let telemetry = collect_telemetry(session, device_id, &keys);
    let alerts = evaluate_alerts(&telemetry);
    let body = if alerts.is_empty() {
        serde_json::json!({"has_alert": false})
    } else {
        serde_json::json!({"has_alert": true, "message": alerts.join(" | ")})
    };
    respond_json(request, 200, body);
}

fn handle_ask(mut request: Request, session: &TelemetrySession, llm: &LlmConfig, device_id: &str) {
    let payload = match parse_json_body(&mut request) {
        Ok(payload) => payload,
        Err(err) => {
            respond_json(request, 400, serde_json::json!({"error": err}));
            return;
        }
    };
    let ask: AskRequest = match serde_json::from_value(payload) {
        Ok(ask) => ask,
        Err(e) => {
            respond_json(request, 400, serde_json::json!({"error": format!("body: {e}")}));
            return;
        }
    };
    let question = ask.question.trim();
    if question.is_empty() {
        respond_json(request, 400, serde_json::json!({"error": "No question provided"}));
        return;
    }

    let snapshot = device_snapshot(session, device_id);
    let chart = extract_chart(session, llm, device_id, question, &snapshot.timeseries_keys);
    let chart_key = chart.as_ref().map(|c| c.label.as_str());
    let answer = answer_question(llm, question, &snapshot.context, chart_key);

    let body = AskResponse { response: answer, data_used: snapshot.context, chart };
    match serde_json::to_value(&body) {
        Ok(value) => respond_json(request, 200, value),
        Err(err) => {
            eprintln!("[server] encode ask response: {err}");
            respond_json(request, 500, serde_json::json!({"error": "internal error"}));
        }
    }
}

fn respond_json(request: Request, status: u16, body: Value) {
    let response = Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(content_type_json());
    let _ = request.respond(response);
}

fn respond_text(request: Request, status: u16, body: &str) {
    let _ = request.respond(Response::from_string(body).with_status_code(status));
}

fn content_type_json() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).expect("static header")
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetrySample;
    use serde_json::json;

    fn series(key: &str, value: Value) -> SeriesMap {
        let mut map = SeriesMap::new();
        map.insert(
            key.to_string(),
            vec![TelemetrySample { ts: 1_700_000_000_000, value }],
        );
        map
    }

    #[test]
    fn test_no_alerts_on_empty_telemetry() {
        assert!(evaluate_alerts(&SeriesMap::new()).is_empty());
    }

    #[test]
    fn test_alarm_count_alerts_when_positive() {
        let alerts = evaluate_alerts(&series(ALARM_KEY, json!(3)));
        assert_eq!(alerts, vec!["Warning: 3 active alarms detected!"]);

        assert!(evaluate_alerts(&series(ALARM_KEY, json!(0))).is_empty());
    }

    #[test]
    fn test_battery_alerts_below_threshold() {
        let alerts = evaluate_alerts(&series(BATTERY_KEY, json!(14.0)));
        assert_eq!(alerts, vec!["Critical: Battery is low (14.0%)"]);

        assert!(evaluate_alerts(&series(BATTERY_KEY, json!(80))).is_empty());
    }

    #[test]
    fn test_string_encoded_battery_value() {
        // The platform sometimes stores numbers as strings.
        let alerts = evaluate_alerts(&series(BATTERY_KEY, json!("14.0")));
        assert_eq!(alerts, vec!["Critical: Battery is low (14.0%)"]);
    }

    #[test]
    fn test_unreadable_values_do_not_alert() {
        assert!(evaluate_alerts(&series(ALARM_KEY, json!("n/a"))).is_empty());
        assert!(evaluate_alerts(&series(BATTERY_KEY, json!(null))).is_empty());
    }

    #[test]
    fn test_both_alerts_combine() {
        let mut telemetry = series(ALARM_KEY, json!("2"));
        telemetry.extend(series(BATTERY_KEY, json!(9)));
        let alerts = evaluate_alerts(&telemetry);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts.join(" | "), "Warning: 2 active alarms detected! | Critical: Battery is low (9%)");
    }
}
