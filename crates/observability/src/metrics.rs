//! Dispatch 指标收集模块
//!
//! 将 `DispatchMetrics` 快照导出为 Prometheus 指标，并在内存中聚合每次 invoke 的统计。

use std::collections::BTreeMap;

use contracts::SmiType;
use dispatcher::MetricsSnapshot;
use metrics::{counter, gauge, histogram};

/// 从 MetricsSnapshot 导出指标
///
/// 计数器使用绝对值，可以周期性调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch_metrics;
///
/// let snapshot = engine.metrics().snapshot();
/// record_dispatch_metrics(&snapshot, engine.registration_count(), engine.active_types().len());
/// ```
pub fn record_dispatch_metrics(snapshot: &MetricsSnapshot, live: usize, active_types: usize) {
    counter!("smi_dispatch_registrations_total").absolute(snapshot.registrations);
    counter!("smi_dispatch_unregistrations_total").absolute(snapshot.unregistrations);
    counter!("smi_dispatch_invocations_total").absolute(snapshot.invocations);
    counter!("smi_dispatch_idle_invocations_total").absolute(snapshot.idle_invocations);
    counter!("smi_dispatch_handler_calls_total").absolute(snapshot.handler_calls);
    counter!("smi_dispatch_handler_failures_total").absolute(snapshot.handler_failures);
    counter!("smi_dispatch_trigger_failures_total", "op" => "enable")
        .absolute(snapshot.enable_failures);
    counter!("smi_dispatch_trigger_failures_total", "op" => "disable")
        .absolute(snapshot.disable_failures);

    gauge!("smi_dispatch_registrations_live").set(live as f64);
    gauge!("smi_dispatch_sources_enabled").set(active_types as f64);
}

/// 记录一次 invoke
pub fn record_invoke(smi_type: SmiType, handlers: usize, latency_us: f64) {
    counter!("smi_dispatch_fired_total", "smi_type" => smi_type.name()).increment(1);
    histogram!("smi_dispatch_handlers_per_invoke", "smi_type" => smi_type.name())
        .record(handlers as f64);
    histogram!("smi_dispatch_invoke_latency_us").record(latency_us);
}

/// 记录注册结果
pub fn record_registration(smi_type: SmiType, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "smi_dispatch_register_attempts_total",
        "smi_type" => smi_type.name(),
        "status" => status
    )
    .increment(1);
}

/// 记录 kernel 启动前阶段耗时
pub fn record_boot_ticks(elapsed_ticks: u64, frequency: u64) {
    gauge!("smi_boot_pre_start_ticks").set(elapsed_ticks as f64);
    if frequency > 0 {
        gauge!("smi_boot_pre_start_ms").set(elapsed_ticks as f64 * 1000.0 / frequency as f64);
    }
}

/// Invoke 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchMetricsAggregator {
    /// invoke 总次数
    pub total_invocations: u64,

    /// 没有任何 handler 的 invoke 次数
    pub idle_invocations: u64,

    /// 每次 invoke 调用的 handler 数
    pub handler_stats: RunningStats,

    /// invoke 耗时 (微秒)
    pub latency_stats: RunningStats,

    /// 各 sub-type 触发次数
    pub fired_counts: BTreeMap<SmiType, u64>,
}

impl DispatchMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, smi_type: SmiType, handlers: usize, latency_us: f64) {
        self.total_invocations += 1;
        if handlers == 0 {
            self.idle_invocations += 1;
        }
        *self.fired_counts.entry(smi_type).or_insert(0) += 1;
        self.handler_stats.push(handlers as f64);
        self.latency_stats.push(latency_us);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_invocations: self.total_invocations,
            idle_invocations: self.idle_invocations,
            idle_rate: if self.total_invocations > 0 {
                self.idle_invocations as f64 / self.total_invocations as f64 * 100.0
            } else {
                0.0
            },
            handlers_per_invoke: StatsSummary::from(&self.handler_stats),
            latency_us: StatsSummary::from(&self.latency_stats),
            fired_counts: self.fired_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_invocations: u64,
    pub idle_invocations: u64,
    pub idle_rate: f64,
    pub handlers_per_invoke: StatsSummary,
    pub latency_us: StatsSummary,
    pub fired_counts: BTreeMap<SmiType, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Total invocations: {}", self.total_invocations)?;
        writeln!(
            f,
            "Idle invocations: {} ({:.2}%)",
            self.idle_invocations, self.idle_rate
        )?;
        writeln!(f, "Handlers per invoke: {}", self.handlers_per_invoke)?;
        writeln!(f, "Invoke latency (us): {}", self.latency_us)?;

        if !self.fired_counts.is_empty() {
            writeln!(f, "Fired per sub-type:")?;
            for (smi_type, count) in &self.fired_counts {
                writeln!(f, "  {}: {}", smi_type, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计 (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
