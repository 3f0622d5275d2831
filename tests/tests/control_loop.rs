// End-to-end control loop scenarios
//
// Real topology store, metrics store, selector and monitor; scripted
// controller.

use std::sync::Arc;
use std::time::Duration;

use raven_core::{LinkKey, LinkMetricsStore, Path, RavenConfig, RavenScorer, Topology};
use raven_daemon::{Monitor, PairOutcome, PathSelector};
use raven_integration_tests::{
    diamond, host_id, host_mac, init_tracing, switch_id, FakeController, InventoryBuilder,
    TestResult,
};
use tokio::sync::watch;

fn path(nodes: &[String]) -> Path {
    Path::new(nodes.to_vec()).unwrap()
}

fn via(switches: &[u8]) -> Vec<String> {
    let mut nodes = vec![host_id(1)];
    nodes.extend(switches.iter().map(|&n| switch_id(n)));
    nodes.push(host_id(2));
    nodes
}

fn targets(ctl: &FakeController) -> Vec<String> {
    ctl.attempts().into_iter().map(|r| r.device_id).collect()
}

#[tokio::test]
async fn reliable_path_wins_the_scoring_scenario() -> TestResult<()> {
    init_tracing();
    let ctl = Arc::new(FakeController::new(diamond()));
    let metrics = Arc::new(LinkMetricsStore::new());
    let topology = Topology::from_inventory(&diamond(), &metrics);
    for _ in 0..3 {
        metrics.record_failure(&LinkKey::new(switch_id(1), switch_id(4)));
    }

    let scorer = RavenScorer::new(&metrics, Default::default());
    let direct = path(&via(&[1, 2, 3]));
    let detour = path(&via(&[1, 4, 3]));
    assert!((scorer.score(&direct) - 0.6).abs() < 1e-9);
    assert!((scorer.score(&detour) - 0.42).abs() < 1e-9);

    let selector = PathSelector::new(ctl.clone(), metrics.clone(), &RavenConfig::default());
    let selection = selector
        .select(&topology, &host_id(1), &host_id(2))
        .expect("a path exists");
    assert_eq!(selection.path, direct);
    assert_eq!(selection.candidates, 2);
    Ok(())
}

#[tokio::test]
async fn second_switch_failure_aborts_remaining_writes() -> TestResult<()> {
    init_tracing();
    let ctl = Arc::new(FakeController::new(diamond()));
    ctl.fail_installs_on(&switch_id(2));
    let metrics = Arc::new(LinkMetricsStore::new());
    let topology = Topology::from_inventory(&diamond(), &metrics);
    let selector = PathSelector::new(ctl.clone(), metrics.clone(), &RavenConfig::default());

    let outcome = selector
        .select_and_install(&topology, &host_id(1), &host_id(2))
        .await?;
    let (switch, link, failures) = match outcome {
        PairOutcome::InstallFailed {
            switch,
            link,
            failures,
            ..
        } => (switch, link, failures),
        other => panic!("expected install failure, got {other:?}"),
    };
    assert_eq!(switch, switch_id(2));
    assert_eq!(link, LinkKey::new(switch_id(1), switch_id(2)));
    assert_eq!(failures, 1);

    // s3 was never attempted
    assert_eq!(targets(&ctl), [switch_id(1), switch_id(2)]);
    assert_eq!(metrics.failure_count(&LinkKey::new(switch_id(2), switch_id(3))), 0);
    assert!((metrics.reliability_of(&LinkKey::new(switch_id(1), switch_id(2))) - 0.9).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn failures_reroute_on_the_next_cycle() -> TestResult<()> {
    init_tracing();
    let ctl = Arc::new(FakeController::new(diamond()));
    let mut monitor = Monitor::new(ctl.clone(), &RavenConfig::default());
    let (_stop_tx, stop) = watch::channel(false);

    ctl.fail_installs_on(&switch_id(2));
    let first = monitor.run_cycle(&stop).await;
    assert_eq!((first.pairs, first.install_failures), (1, 1));
    assert_eq!(targets(&ctl), [switch_id(1), switch_id(2)]);

    ctl.heal_installs();
    ctl.clear_attempts();
    let second = monitor.run_cycle(&stop).await;
    assert_eq!(second.installed, 1);

    let rules = ctl.attempts();
    let hops: Vec<(String, String)> = rules
        .iter()
        .map(|r| (r.device_id.clone(), r.output_port.clone()))
        .collect();
    assert_eq!(
        hops,
        [
            (switch_id(1), "3".to_string()),
            (switch_id(4), "2".to_string()),
            (switch_id(3), "3".to_string()),
        ]
    );
    assert!(rules.iter().all(|r| r.dst_mac == host_mac(2)));
    assert_eq!(
        monitor
            .metrics()
            .failure_count(&LinkKey::new(switch_id(1), switch_id(2))),
        1
    );
    Ok(())
}

#[tokio::test]
async fn install_failure_on_one_pair_does_not_stop_the_cycle() -> TestResult<()> {
    init_tracing();
    let inventory = InventoryBuilder::new()
        .switches(&[1, 2, 3])
        .link(1, 2, 2, 1)
        .link(2, 2, 3, 1)
        .host(1, 1, 1)
        .host(2, 2, 3)
        .host(3, 3, 3)
        .build();
    let ctl = Arc::new(FakeController::new(inventory));
    ctl.fail_installs_towards(&switch_id(2), &host_mac(2));
    let mut monitor = Monitor::new(ctl.clone(), &RavenConfig::default());
    let (_stop_tx, stop) = watch::channel(false);

    let report = monitor.run_cycle(&stop).await;
    assert_eq!(report.pairs, 3);
    assert_eq!(report.install_failures, 1);
    assert_eq!(report.installed, 2);

    // h1->h3 and h2->h3 were written after the h1->h2 failure.
    let towards_h3: Vec<String> = ctl
        .attempts()
        .into_iter()
        .filter(|r| r.dst_mac == host_mac(3))
        .map(|r| r.device_id)
        .collect();
    assert_eq!(
        towards_h3,
        [switch_id(1), switch_id(2), switch_id(3), switch_id(2), switch_id(3)]
    );
    let snapshot = monitor.stats().snapshot();
    assert_eq!((snapshot.installs, snapshot.install_failures), (2, 1));
    Ok(())
}

#[tokio::test]
async fn unaddressed_destination_is_skipped() -> TestResult<()> {
    init_tracing();
    let inventory = InventoryBuilder::new()
        .switches(&[1, 2])
        .link(1, 2, 2, 1)
        .host(1, 1, 1)
        .unaddressed_host(2, 2)
        .host(2, 2, 3)
        .build();
    let ctl = Arc::new(FakeController::new(inventory));
    let mut monitor = Monitor::new(ctl.clone(), &RavenConfig::default());
    let (_stop_tx, stop) = watch::channel(false);

    let report = monitor.run_cycle(&stop).await;
    assert_eq!(report.pairs, 3);
    assert_eq!(report.errors, 1);
    assert_eq!(report.installed, 2);
    assert!(ctl.attempts().iter().all(|r| !r.dst_mac.is_empty()));
    assert_eq!(monitor.stats().snapshot().pair_errors, 1);
    Ok(())
}

#[tokio::test]
async fn host_behind_absent_switch_has_no_route() -> TestResult<()> {
    init_tracing();
    let inventory = InventoryBuilder::new()
        .switches(&[1, 2])
        .link(1, 2, 2, 1)
        .host(1, 1, 1)
        .host(2, 2, 2)
        .host(3, 9, 1)
        .build();
    let ctl = Arc::new(FakeController::new(inventory));
    let mut monitor = Monitor::new(ctl.clone(), &RavenConfig::default());
    let (_stop_tx, stop) = watch::channel(false);

    let report = monitor.run_cycle(&stop).await;
    assert_eq!(report.pairs, 3);
    assert_eq!(report.installed, 1);
    assert_eq!(report.no_route, 2);
    assert!(monitor.topology().contains(&host_id(3)));
    assert!(ctl.attempts().iter().all(|r| r.dst_mac != host_mac(3)));
    assert_eq!(monitor.stats().snapshot().no_route, 2);
    Ok(())
}

#[tokio::test]
async fn unavailable_switch_is_routed_around() -> TestResult<()> {
    init_tracing();
    let inventory = InventoryBuilder::new()
        .switches(&[1, 3, 4])
        .unavailable_switch(2)
        .link(1, 2, 2, 1)
        .link(2, 2, 3, 1)
        .link(1, 3, 4, 1)
        .link(4, 2, 3, 2)
        .host(1, 1, 1)
        .host(2, 3, 3)
        .build();
    let ctl = Arc::new(FakeController::new(inventory));
    let mut monitor = Monitor::new(ctl.clone(), &RavenConfig::default());
    let (_stop_tx, stop) = watch::channel(false);

    let report = monitor.run_cycle(&stop).await;
    assert_eq!(report.installed, 1);
    assert_eq!(targets(&ctl), [switch_id(1), switch_id(4), switch_id(3)]);
    assert!(!monitor.topology().contains(&switch_id(2)));
    Ok(())
}

#[tokio::test]
async fn failed_fetch_leaves_state_untouched() -> TestResult<()> {
    init_tracing();
    let ctl = Arc::new(FakeController::new(diamond()));
    ctl.fail_installs_on(&switch_id(2));
    let mut monitor = Monitor::new(ctl.clone(), &RavenConfig::default());
    let (_stop_tx, stop) = watch::channel(false);
    monitor.run_cycle(&stop).await;

    let nodes = monitor.topology().node_count();
    let tracked = monitor.metrics().len();
    ctl.fail_fetch(true);
    ctl.set_inventory(InventoryBuilder::new().switches(&[7]).build());
    ctl.clear_attempts();

    let report = monitor.run_cycle(&stop).await;
    assert!(!report.fetched);
    assert!(ctl.attempts().is_empty());
    assert_eq!(monitor.topology().node_count(), nodes);
    assert_eq!(monitor.metrics().len(), tracked);
    assert_eq!(
        monitor
            .metrics()
            .failure_count(&LinkKey::new(switch_id(1), switch_id(2))),
        1
    );
    assert_eq!(monitor.stats().snapshot().fetch_failures, 1);
    Ok(())
}

#[tokio::test]
async fn metrics_survive_links_leaving_and_returning() -> TestResult<()> {
    init_tracing();
    let ctl = Arc::new(FakeController::new(diamond()));
    ctl.fail_installs_on(&switch_id(2));
    let mut monitor = Monitor::new(ctl.clone(), &RavenConfig::default());
    let (_stop_tx, stop) = watch::channel(false);
    monitor.run_cycle(&stop).await;
    ctl.heal_installs();

    // s2 disappears for a cycle, then comes back.
    ctl.set_inventory(
        InventoryBuilder::new()
            .switches(&[1, 3, 4])
            .link(1, 3, 4, 1)
            .link(4, 2, 3, 2)
            .host(1, 1, 1)
            .host(2, 3, 3)
            .build(),
    );
    monitor.run_cycle(&stop).await;
    assert!(!monitor.topology().has_link(&switch_id(1), &switch_id(2)));

    ctl.set_inventory(diamond());
    monitor.run_cycle(&stop).await;
    assert!(monitor.topology().has_link(&switch_id(1), &switch_id(2)));
    assert_eq!(
        monitor
            .metrics()
            .failure_count(&LinkKey::new(switch_id(1), switch_id(2))),
        1
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_signal_ends_the_loop() -> TestResult<()> {
    init_tracing();
    let ctl = Arc::new(FakeController::new(diamond()));
    let monitor = Monitor::new(ctl.clone(), &RavenConfig::default());
    let (stop_tx, stop) = watch::channel(false);
    let handle = tokio::spawn(monitor.run(stop));

    // Default cadence: a cycle every 10s.
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(ctl.fetches(), 3);

    stop_tx.send(true)?;
    let stats = tokio::time::timeout(Duration::from_secs(1), handle).await??;
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.cycles, 3);
    assert_eq!(snapshot.installs, 3);
    assert!(stats.render_prometheus().contains("raven_cycles_total 3\n"));
    Ok(())
}
