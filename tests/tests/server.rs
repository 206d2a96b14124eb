mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use reqwest::{Client, StatusCode};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::time::Duration;
    use steadyload::EngineConfig;
    use steadyload_server::LoadTestServer;
    use tokio::net::TcpListener;

    async fn server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = LoadTestServer::new()
            .config(EngineConfig::new().request_timeout(Duration::from_secs(2)));
        tokio::spawn(server.serve(listener));
        addr
    }

    #[tokio::test]
    async fn run_and_export_over_http() -> anyhow::Result<()> {
        let target = mock().await;
        let api = server().await;
        let client = Client::new();

        let res = client
            .post(format!("http://{api}/loadtest?wait=true"))
            .json(&json!({"url": format!("http://{target}/bytes/1256"), "qps": 4, "duration": 1}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let report: Value = res.json().await?;
        assert_eq!(report["total_requests"], 4);
        assert_eq!(report["successful_requests"], 4);
        assert_eq!(report["avg_size"], 1256.0);

        // The report is recorded right after the run releases its slot.
        let mut results = Value::Null;
        for _ in 0..50 {
            results = client
                .get(format!("http://{api}/results"))
                .send()
                .await?
                .json()
                .await?;
            if results.as_array().is_some_and(|r| !r.is_empty()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(results.as_array().map(Vec::len), Some(1));

        let csv = client
            .get(format!("http://{api}/results.csv"))
            .send()
            .await?
            .text()
            .await?;
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(",4,1,4,0,"), "{csv}");

        Ok(())
    }

    #[tokio::test]
    async fn background_run_can_be_stopped() -> anyhow::Result<()> {
        let target = mock().await;
        let api = server().await;
        let client = Client::new();
        let body = json!({"url": format!("http://{target}/delay/ms/1"), "qps": 10, "duration": 30});

        let res = client
            .post(format!("http://{api}/loadtest"))
            .json(&body)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let pending: Value = res.json().await?;
        assert_eq!(pending["total_requests"], 0);

        let res = client
            .post(format!("http://{api}/loadtest"))
            .json(&body)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let status: Value = client
            .get(format!("http://{api}/status"))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(status["planned"], 300);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let res = client.post(format!("http://{api}/stop")).send().await?;
        assert_eq!(res.status(), StatusCode::OK);

        let mut status = Value::Bool(true);
        for _ in 0..50 {
            status = client
                .get(format!("http://{api}/status"))
                .send()
                .await?
                .json()
                .await?;
            if status.is_null() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(status.is_null());

        let res = client.post(format!("http://{api}/stop")).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let detail: Value = res.json().await?;
        assert_eq!(detail["detail"], "No test is currently running.");

        // The report is recorded right after the run releases its slot.
        let mut results = Value::Null;
        for _ in 0..50 {
            results = client
                .get(format!("http://{api}/results"))
                .send()
                .await?
                .json()
                .await?;
            if results.as_array().is_some_and(|r| !r.is_empty()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let total = results[0]["total_requests"].as_u64().unwrap_or_default();
        assert!(total > 0 && total < 300, "{results}");

        Ok(())
    }

    #[tokio::test]
    async fn invalid_request_is_rejected() -> anyhow::Result<()> {
        init();
        let api = server().await;
        let client = Client::new();

        let res = client
            .post(format!("http://{api}/loadtest"))
            .json(&json!({"url": "http://localhost/", "qps": 1, "duration": 0}))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let status: Value = client
            .get(format!("http://{api}/status"))
            .send()
            .await?
            .json()
            .await?;
        assert!(status.is_null());

        Ok(())
    }
}
