//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> engine -> trigger 端到端测试
//! - 随机注册/注销序列的不变量测试
//! - invoke 与 register/unregister 并发测试
//! - kernel 启动流程测试

#[cfg(test)]
mod contract_tests {
    use contracts::SmiType;

    #[test]
    fn test_raw_values_are_stable() {
        assert_eq!(SmiType::Mch.as_raw(), 0);
        assert_eq!(SmiType::GpioUnlock.as_raw() as usize, SmiType::COUNT - 1);
        assert_eq!(SmiType::from_raw(7), Some(SmiType::TcoTimeout));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{handler_fn, OwnerId, SmiEvent, SmiType};
    use dispatcher::{create_engine, DispatchEngine, MockTrigger};

    const CONFIG: &str = r#"
version = "V1"

[dispatcher]
capacity = 8
supported_types = ["tco_timeout", "pme", "intel_usb2", "rtc_alarm"]

[[children]]
name = "watchdog"
smi_type = "tco_timeout"
owner = "tco"

[[children]]
name = "usb-port0"
smi_type = "intel_usb2"
owner = "usb"

[[children]]
name = "usb-port1"
smi_type = "intel_usb2"
owner = "usb"

[[children]]
name = "wake"
smi_type = "pme"
"#;

    type Engine = DispatchEngine<Arc<MockTrigger>, Arc<AtomicU64>>;

    fn counting() -> impl contracts::SmiHandler<Arc<AtomicU64>> + 'static {
        handler_fn(|_: &SmiEvent<'_>, hits: &Arc<AtomicU64>| {
            hits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }

    /// End-to-end test: config -> engine -> MockTrigger -> dispatch_pending
    ///
    /// 验证完整的数据流：
    /// 1. 从 TOML 加载配置并注册 children
    /// 2. 后台任务模拟硬件触发并调用 dispatch_pending
    /// 3. 按 owner 注销后硬件源全部关闭
    #[tokio::test]
    async fn test_e2e_config_to_dispatch() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let trigger = Arc::new(MockTrigger::new());
        let engine: Arc<Engine> = Arc::new(create_engine(&blueprint.dispatcher, Arc::clone(&trigger)));

        let mut hits = Vec::new();
        for child in &blueprint.children {
            let counter = Arc::new(AtomicU64::new(0));
            let handle = match &child.owner {
                Some(owner) => engine.register_owned(
                    owner.clone(),
                    child.smi_type,
                    counting(),
                    Arc::clone(&counter),
                ),
                None => engine.register(child.smi_type, counting(), Arc::clone(&counter)),
            }
            .unwrap();
            hits.push((child.name.clone(), handle, counter));
        }

        assert!(!engine.is_supported(SmiType::Nmi));
        assert_eq!(engine.active_types().len(), 3);
        assert!(trigger.is_enabled(SmiType::IntelUsb2));
        assert!(!trigger.is_enabled(SmiType::RtcAlarm));

        let worker = {
            let engine = Arc::clone(&engine);
            let trigger = Arc::clone(&trigger);
            tokio::spawn(async move {
                let mut calls = 0;
                for round in 0..10u32 {
                    trigger.raise(SmiType::IntelUsb2, 1 << round);
                    if round % 2 == 0 {
                        trigger.raise(SmiType::TcoTimeout, 0x8);
                    }
                    calls += engine.dispatch_pending(0, None);
                    tokio::task::yield_now().await;
                }
                calls
            })
        };
        let calls = worker.await.unwrap();

        // 10 rounds x 2 usb children + 5 watchdog firings
        assert_eq!(calls, 25);
        let count_of = |name: &str| {
            hits.iter()
                .find(|(n, _, _)| n == name)
                .map(|(_, _, c)| c.load(Ordering::Relaxed))
                .unwrap()
        };
        assert_eq!(count_of("usb-port0"), 10);
        assert_eq!(count_of("usb-port1"), 10);
        assert_eq!(count_of("watchdog"), 5);
        assert_eq!(count_of("wake"), 0);

        assert_eq!(engine.unregister_owner(&OwnerId::from("usb")), 2);
        assert!(!trigger.is_enabled(SmiType::IntelUsb2));
        assert!(trigger.is_enabled(SmiType::TcoTimeout));

        assert_eq!(engine.unregister_owner(&OwnerId::from("tco")), 1);
        let wake = hits.iter().find(|(n, _, _)| n == "wake").map(|(_, h, _)| *h).unwrap();
        engine.unregister(wake).unwrap();

        assert!(trigger.enabled().is_empty());
        assert_eq!(engine.registration_count(), 0);

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.registrations, 4);
        assert_eq!(snapshot.unregistrations, 4);
        assert_eq!(snapshot.live(), 0);
        observability::record_dispatch_metrics(&snapshot, 0, 0);
    }
}

#[cfg(test)]
mod invariant_tests {
    use std::sync::{Arc, Mutex};

    use contracts::{handler_fn, DispatchHandle, FiringDetails, SmiEvent, SmiHandler, SmiType};
    use dispatcher::{DispatchEngine, DispatchEngineBuilder, ErrorKind, MockTrigger};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const POOL: [SmiType; 4] = [SmiType::Pme, SmiType::Nmi, SmiType::Spi, SmiType::DevTrap5];
    const CAPACITY: usize = 12;

    fn journaling(journal: &Arc<Mutex<Vec<u64>>>) -> impl SmiHandler<u64> + 'static {
        let journal = Arc::clone(journal);
        handler_fn(move |_: &SmiEvent<'_>, ctx: &u64| {
            journal.lock().unwrap().push(*ctx);
            Ok(())
        })
    }

    /// 随机注册/注销序列：
    /// - trigger 启用当且仅当该 sub-type 有活跃注册
    /// - 已注销的 handle 一律被拒绝，其余 handle 仍然有效
    /// - invoke 严格按注册顺序调用
    #[test]
    fn test_random_sequences_keep_trigger_in_step() {
        for seed in 0..24u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let trigger = Arc::new(MockTrigger::new());
            let engine: DispatchEngine<_, u64> = DispatchEngineBuilder::new(Arc::clone(&trigger))
                .capacity(CAPACITY)
                .supported_types(POOL)
                .build();
            let journal = Arc::new(Mutex::new(Vec::new()));

            let mut live: Vec<(DispatchHandle, SmiType, u64)> = Vec::new();
            let mut dead: Vec<DispatchHandle> = Vec::new();

            for step in 0..300u64 {
                if live.is_empty() || (live.len() < CAPACITY && rng.random_bool(0.55)) {
                    let smi_type = POOL[rng.random_range(0..POOL.len())];
                    let handle = engine.register(smi_type, journaling(&journal), step).unwrap();
                    live.push((handle, smi_type, step));
                } else {
                    let (handle, _, _) = live.remove(rng.random_range(0..live.len()));
                    engine.unregister(handle).unwrap();
                    dead.push(handle);
                }

                for smi_type in POOL {
                    let expected = live.iter().filter(|(_, t, _)| *t == smi_type).count();
                    assert_eq!(engine.handler_count(smi_type), expected, "seed {seed} step {step}");
                    assert_eq!(trigger.is_enabled(smi_type), expected > 0, "seed {seed} step {step}");
                }
            }

            for (handle, _, _) in &live {
                assert!(engine.is_registered(*handle));
            }
            for handle in &dead {
                let err = engine.unregister(*handle).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidParameter);
            }

            for smi_type in POOL {
                journal.lock().unwrap().clear();
                let calls = engine.invoke(smi_type, FiringDetails::default());
                let expected: Vec<u64> = live
                    .iter()
                    .filter(|(_, t, _)| *t == smi_type)
                    .map(|(_, _, ctx)| *ctx)
                    .collect();
                assert_eq!(calls, expected.len());
                assert_eq!(*journal.lock().unwrap(), expected, "seed {seed} {smi_type}");
            }
        }
    }

    #[test]
    fn test_rejected_register_leaves_no_trace() {
        let trigger = Arc::new(MockTrigger::new());
        let engine: DispatchEngine<_, u64> = DispatchEngineBuilder::new(Arc::clone(&trigger))
            .capacity(2)
            .supported_types(POOL)
            .build();
        let journal = Arc::new(Mutex::new(Vec::new()));

        trigger.fail_enable(SmiType::Spi);
        assert_eq!(
            engine.register(SmiType::Spi, journaling(&journal), 0).unwrap_err().kind(),
            ErrorKind::DeviceError
        );
        assert_eq!(
            engine.register(SmiType::Mch, journaling(&journal), 0).unwrap_err().kind(),
            ErrorKind::InvalidParameter
        );

        let first = engine.register(SmiType::Pme, journaling(&journal), 1).unwrap();
        engine.register(SmiType::Pme, journaling(&journal), 2).unwrap();
        assert_eq!(
            engine.register(SmiType::Nmi, journaling(&journal), 3).unwrap_err().kind(),
            ErrorKind::OutOfResources
        );

        assert_eq!(engine.registration_count(), 2);
        assert!(!trigger.is_enabled(SmiType::Spi));
        assert!(!trigger.is_enabled(SmiType::Nmi));

        trigger.recover(SmiType::Spi);
        engine.unregister(first).unwrap();
        engine.register(SmiType::Spi, journaling(&journal), 4).unwrap();
        assert!(trigger.is_enabled(SmiType::Spi));
        assert!(engine.active_types().contains(SmiType::Spi));
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{handler_fn, FiringDetails, OwnerId, SmiEvent, SmiHandler, SmiType};
    use dispatcher::{DispatchEngine, DispatchEngineBuilder, MockTrigger};

    fn counting() -> impl SmiHandler<AtomicU64> + 'static {
        handler_fn(|_: &SmiEvent<'_>, hits: &AtomicU64| {
            hits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }

    /// 多个 CPU 持续 invoke，同时前台反复 register/unregister
    #[test]
    fn test_invoke_races_with_registration() {
        let trigger = Arc::new(MockTrigger::new());
        let engine: DispatchEngine<_, AtomicU64> =
            DispatchEngineBuilder::new(Arc::clone(&trigger)).capacity(8).build();
        let stable = engine
            .register(SmiType::Pme, counting(), AtomicU64::new(0))
            .unwrap();
        let stop = AtomicBool::new(false);

        std::thread::scope(|s| {
            for cpu in 0..4 {
                let engine = &engine;
                let stop = &stop;
                s.spawn(move || {
                    while !stop.load(Ordering::Acquire) {
                        let details = FiringDetails {
                            status: 1,
                            cpu_index: cpu,
                            comm_buffer: None,
                        };
                        let calls = engine.invoke(SmiType::Pme, details);
                        assert!((1..=2).contains(&calls), "calls = {calls}");
                    }
                });
            }

            for _ in 0..500 {
                let extra = engine
                    .register(SmiType::Pme, counting(), AtomicU64::new(0))
                    .unwrap();
                let other = engine
                    .register(SmiType::Nmi, counting(), AtomicU64::new(0))
                    .unwrap();
                assert!(trigger.is_enabled(SmiType::Nmi));

                engine.unregister(extra).unwrap();
                engine.unregister(other).unwrap();
                assert!(trigger.is_enabled(SmiType::Pme));
                assert!(!trigger.is_enabled(SmiType::Nmi));
            }
            stop.store(true, Ordering::Release);
        });

        let stable_hits = engine
            .with_registration(stable, |reg| reg.context().load(Ordering::Relaxed))
            .unwrap();
        assert_eq!(stable_hits, engine.metrics().invocations());
        assert_eq!(engine.registration_count(), 1);
        assert_eq!(trigger.enable_calls(SmiType::Pme), 1);
        assert_eq!(trigger.enable_calls(SmiType::Nmi), 500);
    }

    fn slow(spin_for: Duration) -> impl SmiHandler<AtomicU64> + 'static {
        handler_fn(move |_: &SmiEvent<'_>, hits: &AtomicU64| {
            let started = Instant::now();
            while started.elapsed() < spin_for {
                std::hint::spin_loop();
            }
            hits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }

    /// 慢 handler 持续占用读锁时，前台 register/unregister 仍须在有限时间内完成
    #[test]
    fn test_foreground_completes_under_slow_handlers() {
        let trigger = Arc::new(MockTrigger::new());
        let engine: DispatchEngine<_, AtomicU64> =
            DispatchEngineBuilder::new(Arc::clone(&trigger)).capacity(8).build();
        engine
            .register(SmiType::Pme, slow(Duration::from_micros(100)), AtomicU64::new(0))
            .unwrap();
        engine
            .register(SmiType::RtcAlarm, slow(Duration::from_micros(100)), AtomicU64::new(0))
            .unwrap();
        let owner = OwnerId::from("hotplug");
        let stop = AtomicBool::new(false);

        let worst = std::thread::scope(|s| {
            for cpu in 0..2 {
                let engine = &engine;
                let stop = &stop;
                s.spawn(move || {
                    while !stop.load(Ordering::Acquire) {
                        engine.invoke(SmiType::Pme, FiringDetails::default());
                        engine.dispatch_pending(cpu, None);
                    }
                });
            }
            {
                let engine = &engine;
                let trigger = &trigger;
                let stop = &stop;
                s.spawn(move || {
                    while !stop.load(Ordering::Acquire) {
                        trigger.raise(SmiType::RtcAlarm, 0x1);
                        engine.dispatch_pending(2, None);
                    }
                });
            }

            let mut worst = Duration::ZERO;
            for _ in 0..50 {
                let started = Instant::now();
                let handle = engine
                    .register(SmiType::Nmi, counting(), AtomicU64::new(0))
                    .unwrap();
                engine
                    .register_owned(owner.clone(), SmiType::Spi, counting(), AtomicU64::new(0))
                    .unwrap();
                engine.unregister(handle).unwrap();
                assert_eq!(engine.unregister_owner(&owner), 1);
                worst = worst.max(started.elapsed());
            }
            stop.store(true, Ordering::Release);
            worst
        });

        assert!(worst < Duration::from_secs(1), "slowest foreground round took {worst:?}");
        assert_eq!(engine.registration_count(), 2);
        assert_eq!(trigger.enable_calls(SmiType::Nmi), 50);
        assert_eq!(trigger.disable_calls(SmiType::Spi), 50);
        assert!(!trigger.is_enabled(SmiType::Nmi));
        assert!(!trigger.is_enabled(SmiType::Spi));
        assert!(engine.metrics().invocations() > 0);
    }
}

#[cfg(test)]
mod boot_tests {
    use boot_loader::{try_run_kernel, BootCall, BootError, MockBootConfig, MockBootServices};

    #[test]
    fn test_boot_report_feeds_metrics() {
        let services = MockBootServices::with_config(MockBootConfig {
            frequency: 1_000,
            tick_step: 250,
            ..Default::default()
        });
        let report = try_run_kernel(&services).unwrap();
        assert_eq!(report.elapsed_ticks(), 250);
        assert_eq!(report.elapsed().map(|d| d.as_millis()), Some(250));
        observability::record_boot_ticks(report.elapsed_ticks(), report.frequency);
    }

    #[test]
    fn test_boot_load_failure_signals_nothing() {
        let services = MockBootServices::with_config(MockBootConfig {
            fail_load: Some(BootError::load("bad signature")),
            ..Default::default()
        });
        assert_eq!(
            try_run_kernel(&services).unwrap_err(),
            BootError::load("bad signature")
        );
        assert!(!services.calls().contains(&BootCall::SignalReadyToBoot));
    }
}
