//! `demo` command implementation.
//!
//! Replays four fixed scenarios against in-process replicas.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use dispatcher::{DispatchKind, DispatchResult, MockReplica, QueryDispatcher};

use crate::cli::DemoArgs;

const SLOW_LATENCY: Duration = Duration::from_secs(1);

/// A named replica set with its own deadline
struct Scenario {
    title: &'static str,
    query: &'static str,
    replicas: Vec<Arc<MockReplica>>,
    timeout: Duration,
    expected: DispatchKind,
}

fn scenario(number: u8) -> Scenario {
    let default_timeout = QueryDispatcher::new().timeout();
    match number {
        1 => Scenario {
            title: "One replica answers successfully",
            query: "SELECT * FROM users",
            replicas: vec![
                Arc::new(MockReplica::flaky("Replica 1 (flaky)", 2)),
                Arc::new(MockReplica::ok("Replica 2 (ok)")),
                Arc::new(MockReplica::ok("Replica 3 (slow)").with_latency(SLOW_LATENCY)),
            ],
            timeout: default_timeout,
            expected: DispatchKind::Success,
        },
        2 => Scenario {
            title: "Every replica keeps failing",
            query: "SELECT * FROM users",
            replicas: vec![
                Arc::new(MockReplica::flaky("Replica 1 (flaky)", 3)),
                Arc::new(MockReplica::flaky("Replica 2 (flaky)", 3)),
            ],
            timeout: default_timeout,
            expected: DispatchKind::AllFailed,
        },
        3 => Scenario {
            title: "Deadline shorter than every replica",
            query: "SELECT * FROM users",
            replicas: vec![
                Arc::new(MockReplica::ok("Replica 1 (very slow)").with_latency(SLOW_LATENCY)),
                Arc::new(MockReplica::ok("Replica 2 (very slow)").with_latency(SLOW_LATENCY)),
            ],
            timeout: Duration::from_millis(500),
            expected: DispatchKind::TimedOut,
        },
        _ => Scenario {
            title: "One replica has no data, another succeeds",
            query: "SELECT * FROM users WHERE id=123",
            replicas: vec![
                Arc::new(MockReplica::not_found("Replica 1 (not found)")),
                Arc::new(MockReplica::ok("Replica 2 (ok)")),
            ],
            timeout: default_timeout,
            expected: DispatchKind::Success,
        },
    }
}

async fn play(number: u8) -> DispatchResult {
    let scenario = scenario(number);
    println!("\n--- Scenario {}: {} ---", number, scenario.title);

    let result = QueryDispatcher::new()
        .dispatch_with_timeout(scenario.query, &scenario.replicas, scenario.timeout)
        .await;

    match &result {
        Ok(response) => println!("Final Result: {}", response.payload),
        Err(e) => println!("Error: {}", e),
    }

    let kind = DispatchKind::of(&result);
    info!(
        scenario = number,
        outcome = %kind,
        expected = %scenario.expected,
        "Scenario finished"
    );

    result
}

/// Execute the `demo` command
pub async fn run_demo(args: &DemoArgs) -> Result<()> {
    match args.scenario {
        Some(number) => {
            let _ = play(number).await;
        }
        None => {
            for number in 1..=4 {
                let _ = play(number).await;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_scenarios_reach_expected_outcome() {
        for number in 1..=4 {
            let expected = scenario(number).expected;
            let result = play(number).await;
            assert_eq!(DispatchKind::of(&result), expected, "scenario {}", number);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_replica_wins_first_scenario() {
        let response = play(1).await.unwrap();
        assert_eq!(response.payload, "result from Replica 2 (ok)");

        let response = play(4).await.unwrap();
        assert_eq!(response.replica, "Replica 2 (ok)");
    }
}
