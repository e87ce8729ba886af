//! # Dispatcher
//!
//! SMI child-dispatch 模块。
//!
//! 负责：
//! - 管理 child 注册表 (按 sub-type 分桶，保持注册顺序)
//! - 第一个 child 注册时启用硬件触发源，最后一个注销时关闭
//! - 触发时按注册顺序调用该 sub-type 的所有 handler

pub mod dispatcher;
pub mod error;
mod handle;
pub mod handlers;
pub mod metrics;
pub mod table;
pub mod triggers;
pub mod types;

pub use contracts::{DispatchHandle, FiringDetails, HardwareTrigger, OwnerId, SmiHandler, SmiType};
pub use dispatcher::{create_engine, DispatchEngine, DispatchEngineBuilder, DEFAULT_CAPACITY};
pub use error::{DispatchError, EfiStatus, ErrorKind, Result};
pub use handlers::LogHandler;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use table::{DispatchTable, Registration};
pub use triggers::{LogTrigger, MockTrigger, MockTriggerConfig, TriggerCall};
pub use types::SmiTypeSet;
