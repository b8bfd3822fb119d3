use mibridge_shared::mina::now_millis;
use mibridge_shared::{
    ConversationQuery, ConversationRecord, Error, MinaClient, Result, resolve_device_by_name,
};
use tracing::info;

pub struct Options {
    pub name: String,
    pub limit: u32,
    pub window: Option<u64>,
}

/// Resolve the named speaker and render what it was asked.
pub async fn run(client: &MinaClient, options: &Options) -> Result<String> {
    let devices = client.device_list().await?;
    let target = resolve_device_by_name(&options.name, &devices)?;
    info!(hardware = %target.hardware, device_id = %target.device_id, "Resolved speaker");

    match options.window {
        Some(window) => {
            let queries = client
                .fetch_recent_queries(&target.hardware, &target.device_id, options.limit, window)
                .await?;
            Ok(render_queries(&queries))
        }
        None => {
            let records = client
                .conversation(&ConversationQuery {
                    hardware: target.hardware,
                    device_id: target.device_id,
                    timestamp_millis: now_millis(),
                    limit: options.limit,
                })
                .await?;
            render_records(&records)
        }
    }
}

fn render_records(records: &[ConversationRecord]) -> Result<String> {
    serde_json::to_string_pretty(records)
        .map_err(|e| Error::Upstream(format!("Failed to render records: {e}")))
}

fn render_queries(queries: &[String]) -> String {
    if queries.is_empty() {
        return "(no recent queries)".to_string();
    }
    queries.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::{Json, Router, extract::Query, routing::get};
    use mibridge_shared::CookieSet;
    use serde_json::json;

    /// Speaker cloud with a Bedroom and a Kitchen speaker; the Kitchen has three
    /// records aged 2s, 45s and 90s relative to the requested timestamp.
    async fn upstream() -> MinaClient {
        let app = Router::new()
            .route(
                "/admin/v2/device_list",
                get(|| async {
                    Json(json!({
                        "code": 0,
                        "data": [
                            { "name": "Bedroom", "hardware": "L05C", "deviceID": "abc" },
                            { "name": "Kitchen", "hardware": "LX06", "deviceID": "def" }
                        ]
                    }))
                }),
            )
            .route(
                "/conversation",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let ts: i64 = params["timestamp"].parse().unwrap();
                    let data = if params["hardware"] == "LX06" {
                        json!({ "records": [
                            { "query": "set a timer", "time": ts - 2_000 },
                            { "query": "what's the weather", "time": ts - 45_000 },
                            { "query": "play jazz", "time": ts - 90_000 }
                        ]})
                    } else {
                        json!({ "records": [] })
                    };
                    Json(json!({ "code": 0, "data": data.to_string() }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let cookies = CookieSet {
            device_id: "PASSPORT".to_string(),
            service_token: "TOKEN".to_string(),
            user_id: "42".to_string(),
        };
        MinaClient::with_endpoints(cookies, base.clone(), format!("{base}/conversation"), Duration::from_secs(5))
            .unwrap()
    }

    fn options(name: &str, window: Option<u64>) -> Options {
        Options {
            name: name.to_string(),
            limit: 3,
            window,
        }
    }

    #[tokio::test]
    async fn test_run_prints_records_for_known_speaker() {
        let client = upstream().await;
        let output = run(&client, &options("Kitchen", None)).await.unwrap();

        let records: Vec<ConversationRecord> = serde_json::from_str(&output).unwrap();
        let queries: Vec<&str> = records.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["set a timer", "what's the weather", "play jazz"]);
    }

    #[tokio::test]
    async fn test_run_unknown_speaker_is_not_found() {
        let client = upstream().await;
        let result = run(&client, &options("Garage", None)).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_run_with_window_prints_recent_queries() {
        let client = upstream().await;
        let output = run(&client, &options("Kitchen", Some(60))).await.unwrap();
        assert_eq!(output, "set a timer\nwhat's the weather");

        let output = run(&client, &options("Bedroom", Some(60))).await.unwrap();
        assert_eq!(output, "(no recent queries)");
    }

    #[test]
    fn test_render_records() {
        let records = vec![ConversationRecord {
            query: "what's the weather".to_string(),
            time: 1_700_000_000_000,
        }];
        let rendered = render_records(&records).unwrap();
        assert!(rendered.contains("\"query\": \"what's the weather\""));
        assert!(rendered.contains("\"time\": 1700000000000"));
    }

    #[test]
    fn test_render_queries() {
        assert_eq!(render_queries(&[]), "(no recent queries)");
        assert_eq!(
            render_queries(&["one".to_string(), "two".to_string()]),
            "one\ntwo"
        );
    }
}
