//! # Dispatcher
//!
//! 查询分发模块。
//!
//! 负责：
//! - 对每个副本启动独立 worker，带有限次数重试
//! - 第一个成功结果胜出，取消其余 worker
//! - 全局超时，结果只返回一次

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod outcome;
pub mod replicas;
mod session;
mod worker;

pub use contracts::{Query, ReplicaClient, ReplicaError};
pub use dispatcher::{dispatch, DispatcherBuilder, QueryDispatcher};
pub use error::DispatchError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use outcome::{AttemptOutcome, DispatchKind, DispatchResult, QueryResponse};
pub use replicas::{mock_replicas, MockReplica};
pub use worker::WorkerExit;
