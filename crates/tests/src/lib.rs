//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 分发行为测试（竞速、重试上限、超时、全部失败）
//! - 配置文件到分发结果的 e2e 测试

#[cfg(test)]
mod contract_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ClusterBlueprint, DispatchConfig, ReplicaBehavior, ReplicaConfig};

    /// 合约快照：配置写出后再读入保持一致，未写的字段取默认值
    #[test]
    fn test_blueprint_survives_toml_and_json() {
        let blueprint = ClusterBlueprint {
            version: contracts::ConfigVersion::V1,
            dispatch: DispatchConfig {
                max_attempts: 4,
                retry_interval_ms: 250,
                timeout_ms: 1500,
            },
            replicas: vec![
                ReplicaConfig::new("replica-1", ReplicaBehavior::Flaky).with_failures(1),
                ReplicaConfig::new("replica-2", ReplicaBehavior::Ok).with_latency_ms(50),
            ],
        };

        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let from_toml = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(from_toml.dispatch, blueprint.dispatch);
        assert_eq!(from_toml.replicas, blueprint.replicas);

        let json = ConfigLoader::to_json(&blueprint).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(from_json.dispatch.retry_interval(), Duration::from_millis(250));
        assert_eq!(from_json.replicas, blueprint.replicas);
    }

    #[test]
    fn test_dispatch_defaults_when_section_missing() {
        let toml = r#"
[[replicas]]
name = "replica-1"
"#;
        let blueprint = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();

        assert_eq!(blueprint.dispatch, DispatchConfig::default());
        assert_eq!(blueprint.dispatch.timeout(), Duration::from_secs(2));
        assert_eq!(blueprint.replicas[0].behavior, ReplicaBehavior::Ok);
        assert_eq!(blueprint.replicas[0].payload_or_default(), "result from replica-1");
    }
}

#[cfg(test)]
mod dispatch_tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{CancellationToken, Query, ReplicaClient, ReplicaError};
    use dispatcher::{dispatch, DispatchError, DispatchKind, MockReplica, QueryDispatcher};
    use tokio::time::{sleep, Instant};

    const QUERY: &str = "SELECT * FROM users WHERE id=123";

    /// Replica that counts started and completed calls
    struct RecordingReplica {
        name: String,
        answer_after: Duration,
        calls: AtomicU32,
        completed: AtomicU32,
    }

    impl RecordingReplica {
        fn new(name: &str, answer_after: Duration) -> Self {
            Self {
                name: name.to_string(),
                answer_after,
                calls: AtomicU32::new(0),
                completed: AtomicU32::new(0),
            }
        }
    }

    impl ReplicaClient for RecordingReplica {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(
            &self,
            _query: &Query,
            _cancel: &CancellationToken,
        ) -> Result<String, ReplicaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(self.answer_after).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(format!("result from {}", self.name))
        }
    }

    /// 单一胜者：最终成功的副本结果被返回，取消后不再有新的尝试
    #[tokio::test(start_paused = true)]
    async fn test_single_winner_stops_other_workers() {
        let replicas = vec![
            Arc::new(MockReplica::flaky("replica-1", 1)),
            Arc::new(MockReplica::failing("replica-2").with_latency(Duration::from_millis(300))),
        ];
        let dispatcher = QueryDispatcher::builder()
            .max_attempts(5)
            .retry_interval(Duration::from_millis(500))
            .timeout(Duration::from_secs(10))
            .build();

        let response = dispatcher.dispatch(QUERY, &replicas).await.unwrap();
        assert_eq!(response.payload, "result from replica-1");
        assert_eq!(response.attempt, 2);

        // replica-2 was in backoff when the winner arrived
        sleep(Duration::from_secs(5)).await;
        assert_eq!(replicas[0].calls(), 2);
        assert_eq!(replicas[1].calls(), 1);
    }

    /// 竞速：两个都成功时返回其中之一，绝不报错
    #[tokio::test]
    async fn test_two_successful_replicas_never_error() {
        let replicas = vec![
            Arc::new(MockReplica::ok("replica-a")),
            Arc::new(MockReplica::ok("replica-b")),
        ];

        for _ in 0..10 {
            let response = dispatch(QUERY, &replicas, Duration::from_secs(2))
                .await
                .unwrap();
            assert!(
                response.payload == "result from replica-a"
                    || response.payload == "result from replica-b"
            );
        }
    }

    /// 取消会丢弃仍在进行中的调用，即使副本本身忽略取消令牌
    #[tokio::test(start_paused = true)]
    async fn test_in_flight_call_abandoned_on_win() {
        let replicas = vec![
            Arc::new(RecordingReplica::new("fast", Duration::from_millis(10))),
            Arc::new(RecordingReplica::new("slow", Duration::from_secs(5))),
        ];

        let response = dispatch(QUERY, &replicas, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(response.replica, "fast");

        sleep(Duration::from_secs(10)).await;
        assert_eq!(replicas[1].calls.load(Ordering::SeqCst), 1);
        assert_eq!(replicas[1].completed.load(Ordering::SeqCst), 0);
    }

    /// 未找到不会阻塞其他副本
    #[tokio::test(start_paused = true)]
    async fn test_not_found_does_not_block_others() {
        let replicas = vec![
            Arc::new(MockReplica::not_found("replica-1")),
            Arc::new(MockReplica::ok("replica-2").with_latency(Duration::from_millis(200))),
        ];
        let dispatcher = QueryDispatcher::new();

        let response = dispatcher.dispatch(QUERY, &replicas).await.unwrap();

        assert_eq!(response.replica, "replica-2");
        assert_eq!(response.replica_index, 1);
        assert_eq!(replicas[0].calls(), 1);
        assert_eq!(dispatcher.metrics().not_found, 1);
        assert_eq!(dispatcher.metrics().retries, 0);
    }

    /// 重试上限：max_attempts - 1 次失败后成功仍被采用
    #[tokio::test(start_paused = true)]
    async fn test_success_on_last_allowed_attempt() {
        let replicas = vec![Arc::new(MockReplica::flaky("replica-1", 2))];
        let dispatcher = QueryDispatcher::builder()
            .max_attempts(3)
            .retry_interval(Duration::from_millis(100))
            .build();

        let response = dispatcher.dispatch(QUERY, &replicas).await.unwrap();

        assert_eq!(response.attempt, 3);
        assert_eq!(replicas[0].calls(), 3);
        assert_eq!(dispatcher.metrics().retries, 2);
    }

    /// 重试上限：max_attempts 次失败不贡献任何结果
    #[tokio::test(start_paused = true)]
    async fn test_exhausted_replica_contributes_nothing() {
        let replicas = vec![Arc::new(MockReplica::flaky("replica-1", 3))];
        let dispatcher = QueryDispatcher::builder()
            .max_attempts(3)
            .retry_interval(Duration::from_millis(100))
            .build();

        let result = dispatcher.dispatch(QUERY, &replicas).await;

        assert_eq!(result, Err(DispatchError::AllFailed { replicas: 1 }));
        assert_eq!(replicas[0].calls(), 3);
    }

    /// 全部失败：所有重试用尽后才返回，不会提前
    #[tokio::test(start_paused = true)]
    async fn test_all_failed_after_every_retry() {
        let replicas = vec![
            Arc::new(MockReplica::failing("replica-1")),
            Arc::new(MockReplica::failing("replica-2")),
        ];
        let dispatcher = QueryDispatcher::builder()
            .max_attempts(3)
            .retry_interval(Duration::from_millis(500))
            .timeout(Duration::from_secs(2))
            .build();

        let started = Instant::now();
        let result = dispatcher.dispatch(QUERY, &replicas).await;

        assert_eq!(result, Err(DispatchError::AllFailed { replicas: 2 }));
        // a backoff follows every failure, including the last one
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert!(started.elapsed() < Duration::from_millis(2000));
        assert_eq!(replicas[0].calls(), 3);
        assert_eq!(replicas[1].calls(), 3);
        assert_eq!(dispatcher.metrics().attempts, 6);
    }

    /// 最后一次失败后的退避仍计入截止时间：退避未结束前截止时间到达则为 TimedOut
    #[tokio::test(start_paused = true)]
    async fn test_deadline_during_final_backoff_is_timeout() {
        let replicas = vec![
            Arc::new(MockReplica::failing("replica-1")),
            Arc::new(MockReplica::failing("replica-2")),
        ];
        let dispatcher = QueryDispatcher::builder()
            .max_attempts(3)
            .retry_interval(Duration::from_millis(500))
            .timeout(Duration::from_millis(1200))
            .build();

        let started = Instant::now();
        let result = dispatcher.dispatch(QUERY, &replicas).await;

        assert_eq!(DispatchKind::of(&result), DispatchKind::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(1200));
        assert!(started.elapsed() < Duration::from_millis(1500));
        assert_eq!(replicas[0].calls(), 3);
        assert_eq!(replicas[1].calls(), 3);
    }

    /// 超时：副本阻塞超过截止时间时返回 TimedOut
    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_replicas_block() {
        let replicas = vec![
            Arc::new(MockReplica::hanging("replica-1")),
            Arc::new(MockReplica::ok("replica-2").with_latency(Duration::from_secs(1))),
        ];

        let started = Instant::now();
        let result = dispatch(QUERY, &replicas, Duration::from_millis(300)).await;

        assert!(result.as_ref().is_err_and(|e| e.is_timed_out()));
        assert_eq!(result.unwrap_err().to_string(), "query timed out after 300ms");
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    /// 空副本集：立即返回 AllFailed
    #[tokio::test]
    async fn test_empty_replica_set() {
        let replicas: Vec<Arc<MockReplica>> = Vec::new();

        let started = Instant::now();
        let result = dispatch(QUERY, &replicas, Duration::from_secs(2)).await;

        assert!(result.is_err_and(|e| e.is_all_failed()));
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    /// 幂等性：确定性副本重复分发得到相同的结果类型
    #[tokio::test(start_paused = true)]
    async fn test_repeated_dispatches_are_stable() {
        let winners = vec![
            Arc::new(MockReplica::not_found("replica-1")),
            Arc::new(MockReplica::ok("replica-2").with_latency(Duration::from_millis(20))),
        ];
        let losers = vec![
            Arc::new(MockReplica::failing("replica-1")),
            Arc::new(MockReplica::not_found("replica-2")),
        ];
        let dispatcher = QueryDispatcher::builder()
            .retry_interval(Duration::from_millis(50))
            .build();

        for _ in 0..5 {
            let result = dispatcher.dispatch(QUERY, &winners).await;
            assert_eq!(DispatchKind::of(&result), DispatchKind::Success);

            let result = dispatcher.dispatch(QUERY, &losers).await;
            assert_eq!(DispatchKind::of(&result), DispatchKind::AllFailed);
        }

        let metrics = dispatcher.metrics();
        assert_eq!(metrics.dispatches, 10);
        assert_eq!(metrics.successes, 5);
        assert_eq!(metrics.all_failed, 5);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::{mock_replicas, DispatchError, QueryDispatcher};

    const CLUSTER: &str = r#"
[dispatch]
max_attempts = 3
retry_interval_ms = 500
timeout_ms = 2000

[[replicas]]
name = "replica-1"
behavior = "flaky"
failures = 2

[[replicas]]
name = "replica-2"
behavior = "ok"
latency_ms = 50

[[replicas]]
name = "replica-3"
behavior = "ok"
latency_ms = 1000
"#;

    /// End-to-end test: TOML config -> MockReplica set -> QueryDispatcher
    #[tokio::test(start_paused = true)]
    async fn test_config_to_dispatch() {
        let blueprint = ConfigLoader::load_from_str(CLUSTER, ConfigFormat::Toml).unwrap();
        let replicas = mock_replicas(&blueprint);
        let dispatcher = QueryDispatcher::from_config(&blueprint.dispatch);

        assert_eq!(replicas.len(), 3);
        assert_eq!(dispatcher.timeout(), Duration::from_secs(2));

        let response = dispatcher
            .dispatch("SELECT * FROM users", &replicas)
            .await
            .unwrap();

        assert_eq!(response.replica, "replica-2");
        assert_eq!(response.payload, "result from replica-2");
        assert!(response.elapsed >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_config_all_flaky_fails() {
        let json = r#"{
            "dispatch": { "max_attempts": 2, "retry_interval_ms": 100, "timeout_ms": 1000 },
            "replicas": [
                { "name": "a", "behavior": "flaky", "failures": 2 },
                { "name": "b", "behavior": "flaky", "failures": 2 }
            ]
        }"#;
        let blueprint = ConfigLoader::load_from_str(json, ConfigFormat::Json).unwrap();
        let replicas = mock_replicas(&blueprint);

        let result = QueryDispatcher::from_config(&blueprint.dispatch)
            .dispatch("SELECT 1", &replicas)
            .await;

        assert_eq!(result, Err(DispatchError::AllFailed { replicas: 2 }));
    }

    #[test]
    fn test_invalid_config_rejected_before_dispatch() {
        let toml = r#"
[dispatch]
max_attempts = 0

[[replicas]]
name = "replica-1"
"#;
        assert!(ConfigLoader::load_from_str(toml, ConfigFormat::Toml).is_err());
    }
}
