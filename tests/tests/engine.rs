mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use steadyload::prelude::*;

    fn generator(config: EngineConfig) -> LoadGenerator<HttpExecutor> {
        LoadGenerator::with_config(HttpExecutor::new(&config).unwrap(), config)
    }

    #[tokio::test]
    async fn steady_run_hits_plan() {
        let addr = mock().await;
        let generator = generator(EngineConfig::default());

        let report = generator
            .start_run(RunRequest::new(format!("http://{addr}/delay/ms/5"), 20, 2))
            .await
            .unwrap();

        assert_eq!(report.total_requests, 40);
        assert_eq!(report.successful_requests, 40);
        assert_eq!(report.failed_requests, 0);
        assert_eq!(report.error_rate_percent, 0.);
        assert!(report.min_latency >= 0.005);
        assert!(
            (15. ..=25.).contains(&report.observed_requests_per_second),
            "{report}"
        );
    }

    #[tokio::test]
    async fn server_errors_are_failures() {
        let addr = mock().await;
        let generator = generator(EngineConfig::default());

        let report = generator
            .start_run(RunRequest::new(format!("http://{addr}/status/500"), 5, 1))
            .await
            .unwrap();

        assert_eq!(report.total_requests, 5);
        assert_eq!(report.failed_requests, 5);
        assert_eq!(report.error_rate_percent, 100.);
        assert_eq!(report.avg_latency, 0.);
        assert_eq!(report.avg_response_size, 0.);
    }

    #[tokio::test]
    async fn response_size_is_averaged() {
        let addr = mock().await;
        let generator = generator(EngineConfig::default());

        let report = generator
            .start_run(RunRequest::new(format!("http://{addr}/bytes/1256"), 4, 1))
            .await
            .unwrap();

        assert_eq!(report.successful_requests, 4);
        assert_eq!(report.avg_response_size, 1256.);
    }

    #[tokio::test]
    async fn request_timeout_is_a_failure() {
        let addr = mock().await;
        let generator =
            generator(EngineConfig::new().request_timeout(Duration::from_millis(50)));

        let report = generator
            .start_run(RunRequest::new(format!("http://{addr}/delay/ms/500"), 2, 1))
            .await
            .unwrap();

        assert_eq!(report.total_requests, 2);
        assert_eq!(report.failed_requests, 2);
    }

    #[tokio::test]
    async fn unreachable_target_is_a_failure() {
        init();
        let generator = generator(EngineConfig::default());

        let report = generator
            .start_run(RunRequest::new("http://127.0.0.1:1/", 3, 1))
            .await
            .unwrap();

        assert_eq!(report.total_requests, 3);
        assert_eq!(report.failed_requests, 3);
    }

    #[tokio::test]
    async fn rate_limited_target_reports_partial_failures() {
        let addr = mock().await;
        let generator = generator(EngineConfig::default());

        let report = generator
            .start_run(RunRequest::new(
                format!("http://{addr}/max/5/delay/ms/1"),
                20,
                1,
            ))
            .await
            .unwrap();

        assert_eq!(report.total_requests, 20);
        assert!(report.successful_requests > 0, "{report}");
        assert!(report.failed_requests > 0, "{report}");
    }

    #[tokio::test]
    async fn cancel_mid_run_then_rerun() {
        let addr = mock().await;
        let generator = Arc::new(generator(EngineConfig::default()));
        let url = format!("http://{addr}/delay/ms/5");

        let run = generator.begin(RunRequest::new(url.clone(), 10, 10)).unwrap();
        let handle = run.handle();
        let task = tokio::spawn(run.execute());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let dispatched = handle.dispatched();
        generator.cancel_run().unwrap();

        let report = task.await.unwrap();
        assert!(report.total_requests >= dispatched);
        assert!(report.total_requests < 100);
        assert_eq!(report.total_requests, report.successful_requests);
        assert!(generator.active_run().unwrap().is_none());

        let report = generator
            .start_run(RunRequest::new(url, 5, 1))
            .await
            .unwrap();
        assert_eq!(report.total_requests, 5);
    }

    #[tokio::test]
    async fn concurrent_start_is_rejected() {
        let addr = mock().await;
        let generator = Arc::new(generator(EngineConfig::default()));

        let run = generator
            .begin(RunRequest::new(format!("http://{addr}/delay/ms/1"), 5, 1))
            .unwrap();
        let task = tokio::spawn(run.execute());

        let err = generator
            .start_run(RunRequest::new(format!("http://{addr}/delay/ms/1"), 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RunInProgress(_)));

        let report = task.await.unwrap();
        assert_eq!(report.total_requests, 5);
    }

    #[cfg(feature = "integration")]
    #[tokio::test(flavor = "multi_thread")]
    async fn sustained_rate() {
        let addr = mock().await;
        let generator = generator(EngineConfig::default());

        let report = generator
            .start_run(RunRequest::new(format!("http://{addr}/delay/ms/20"), 500, 10))
            .await
            .unwrap();

        assert_eq!(report.total_requests, 5_000);
        assert_eq!(report.failed_requests, 0);
        assert!(
            (450. ..=550.).contains(&report.observed_requests_per_second),
            "{report}"
        );
        assert!(report.p90_latency >= 0.02);
    }
}
