#![allow(clippy::unwrap_used, clippy::float_cmp)]
// Integration tests for the polling engine and topology discovery, run
// against in-memory agents.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use hnm_core::{
    CoreError, DeviceDescriptor, DeviceFamily, EngineState, Fleet, FleetUpdate, InterfaceSample,
    Link, LinkMedium, MemoryStore, PollerConfig, PollingEngine, SampleStore, Topology,
    TopologyBuilder, oids,
};
use hnm_snmp::{Connector, MemoryAgent, MemoryConnector, Oid, Session, SessionConfig, SnmpValue};
use pretty_assertions::assert_eq;

// ── Helpers ──────────────────────────────────────────────────────────

/// Serves an agent whose counters grow by 1000 octets in and 2000 out on
/// every new session.
#[derive(Default)]
struct RampConnector {
    sessions: AtomicU64,
}

impl Connector for RampConnector {
    fn connect(&self, config: &SessionConfig) -> Result<Box<dyn Session>, hnm_snmp::Error> {
        let n = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        let agent = MemoryAgent::new()
            .with_column(oids::IF_NAME, [(vec![1], "ether1")])
            .with_column(oids::IF_OPER_STATUS, [(vec![1], SnmpValue::Integer(1))])
            .with_column(oids::IF_HC_IN_OCTETS, [(vec![1], SnmpValue::Counter64(n * 1000))])
            .with_column(oids::IF_HC_OUT_OCTETS, [(vec![1], SnmpValue::Counter64(n * 2000))]);
        MemoryConnector::new()
            .with_agent(config.host.clone(), agent)
            .connect(config)
    }
}

/// Rejects every sample.
#[derive(Default)]
struct RejectingStore {
    attempts: AtomicUsize,
}

impl SampleStore for RejectingStore {
    fn persist(&self, sample: &InterfaceSample) -> Result<(), CoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CoreError::Store {
            series: sample.series_key(),
            message: "disk full".into(),
        })
    }

    fn latest_per_series(&self) -> Result<Vec<InterfaceSample>, CoreError> {
        Ok(Vec::new())
    }

    fn history(&self, _: &str, _: &str, _: usize) -> Result<Vec<InterfaceSample>, CoreError> {
        Ok(Vec::new())
    }
}

fn lldp_agent(local_ports: &[(u32, &str)], neighbors: &[(u32, &str, &str)]) -> MemoryAgent {
    let mut agent = MemoryAgent::new().with_column(
        oids::IF_NAME,
        local_ports.iter().map(|&(i, name)| (vec![i], name)),
    );
    for (row, &(port, system, remote_port)) in neighbors.iter().enumerate() {
        let row = u32::try_from(row).unwrap() + 1;
        agent = agent
            .with(Oid::from(oids::LLDP_REM_SYS_NAME).join(&[0, port, row]), system)
            .with(Oid::from(oids::LLDP_REM_PORT_ID).join(&[0, port, row]), remote_port);
    }
    agent
}

fn config(interval: Duration) -> PollerConfig {
    PollerConfig {
        interval,
        ..PollerConfig::default()
    }
}

fn summary(links: &[Link]) -> Vec<(&str, &str, &str)> {
    links
        .iter()
        .map(|l| {
            (
                l.source_device.as_str(),
                l.source_interface.as_str(),
                l.target_device.as_str(),
            )
        })
        .collect()
}

// ── Sampling ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tick_loop_derives_rates_from_consecutive_cycles() {
    let store = Arc::new(MemoryStore::default());
    let engine = PollingEngine::new(
        config(Duration::from_millis(200)),
        Arc::new(RampConnector::default()),
        Arc::clone(&store) as Arc<dyn SampleStore>,
        Fleet {
            devices: vec![DeviceDescriptor::new("core", "10.0.0.1", DeviceFamily::Generic)],
            topology: Topology::default(),
        },
    );

    let mut reports = engine.reports();
    engine.start().await;
    assert_ne!(*engine.state().borrow(), EngineState::Stopped);

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            reports.changed().await.unwrap();
            let done = reports.borrow_and_update().as_ref().is_some_and(|r| r.cycle >= 2);
            if done {
                break;
            }
        }
    })
    .await
    .unwrap();
    engine.shutdown().await;
    assert_eq!(*engine.state().borrow(), EngineState::Stopped);

    let history = store.history("core", "ether1", 10).unwrap();
    assert!(history.len() >= 2);
    let newest = &history[0];
    let previous = &history[1];
    assert!(newest.in_bps > 0.0);
    // out grows twice as fast as in
    assert!((newest.out_bps - 2.0 * newest.in_bps).abs() < 1e-6);
    assert_eq!(newest.in_octets - previous.in_octets, 1000);
    // the very first sample of the series carries no rate
    let oldest = history.last().unwrap();
    assert_eq!((oldest.in_bps, oldest.out_bps), (0.0, 0.0));
}

#[tokio::test]
async fn persist_failures_do_not_stop_the_cycle() {
    let store = Arc::new(RejectingStore::default());
    let counters = [(vec![1], SnmpValue::Counter64(1)), (vec![2], SnmpValue::Counter64(2))];
    let agent = lldp_agent(&[(1, "ether1"), (2, "ether2")], &[])
        .with_column(oids::IF_HC_IN_OCTETS, counters.clone())
        .with_column(oids::IF_HC_OUT_OCTETS, counters);
    let connector = MemoryConnector::new().with_agent("10.0.0.1", agent);
    let engine = PollingEngine::new(
        PollerConfig::default(),
        Arc::new(connector),
        Arc::clone(&store) as Arc<dyn SampleStore>,
        Fleet {
            devices: vec![DeviceDescriptor::new("core", "10.0.0.1", DeviceFamily::Generic)],
            topology: Topology::default(),
        },
    );

    let report = engine.run_cycle().await;
    assert_eq!(report.persist_failures, 2);
    assert_eq!(report.samples, 0);
    assert!(report.failed.is_empty());
    assert_eq!(store.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fleet_swap_applies_to_the_next_cycle() {
    let engine = PollingEngine::new(
        PollerConfig::default(),
        Arc::new(RampConnector::default()),
        Arc::new(MemoryStore::default()),
        Fleet::default(),
    );
    assert_eq!(engine.run_cycle().await.devices, 0);

    engine.apply(FleetUpdate::Devices(vec![
        DeviceDescriptor::new("a", "10.0.0.1", DeviceFamily::Generic),
        DeviceDescriptor::new("b", "10.0.0.2", DeviceFamily::Generic),
    ]));
    let report = engine.run_cycle().await;
    assert_eq!(report.devices, 2);
    assert_eq!(report.samples, 2);
}

#[tokio::test]
async fn follow_applies_pushed_updates() {
    let engine = PollingEngine::new(
        PollerConfig::default(),
        Arc::new(MemoryConnector::new()),
        Arc::new(MemoryStore::default()),
        Fleet::default(),
    );
    let (tx, rx) = tokio::sync::mpsc::channel(4);
    engine.follow(rx).await;

    let topology = Topology::new(vec![Link::discovered("a", "ether1", "b", None)]);
    tx.send(FleetUpdate::Topology(topology.clone())).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while engine.fleet().topology != topology {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    engine.shutdown().await;
}

// ── Topology ─────────────────────────────────────────────────────────

#[tokio::test]
async fn mutual_neighbors_keep_both_directions() {
    let connector = MemoryConnector::new()
        .with_agent("10.0.0.1", lldp_agent(&[(1, "ether1")], &[(1, "switch", "port-1")]))
        .with_agent("10.0.0.2", lldp_agent(&[(1, "port-1")], &[(1, "router", "ether1")]));
    let builder = TopologyBuilder::new(Arc::new(connector), 4);

    let topology = builder
        .build(&[
            DeviceDescriptor::new("router", "10.0.0.1", DeviceFamily::Generic),
            DeviceDescriptor::new("switch", "10.0.0.2", DeviceFamily::UniFi),
        ])
        .await;

    assert_eq!(
        summary(&topology.links),
        vec![("router", "ether1", "switch"), ("switch", "port-1", "router")]
    );
    assert_eq!(topology.links[0].target_interface.as_deref(), Some("port-1"));
}

#[tokio::test]
async fn mndp_duplicates_of_lldp_links_collapse() {
    let agent = lldp_agent(&[(1, "ether1"), (2, "wlan1")], &[(1, "switch", "port-1")])
        .with_column(
            oids::MNDP_NEIGHBOR_IDENTITY,
            [(vec![7], "switch"), (vec![8], "hap")],
        )
        .with_column(
            oids::MNDP_NEIGHBOR_INTERFACE,
            [(vec![7], SnmpValue::Integer(1)), (vec![8], SnmpValue::Integer(2))],
        );
    let connector = MemoryConnector::new().with_agent("10.0.0.1", agent);
    let builder = TopologyBuilder::new(Arc::new(connector), 4);

    let topology = builder
        .build(&[
            DeviceDescriptor::new("router", "10.0.0.1", DeviceFamily::MikroTik),
            // unreachable devices contribute nothing
            DeviceDescriptor::new("ghost", "10.0.0.66", DeviceFamily::MikroTik),
        ])
        .await;

    assert_eq!(
        summary(&topology.links),
        vec![("router", "ether1", "switch"), ("router", "wlan1", "hap")]
    );
    // LLDP ran first and kept its remote port
    assert_eq!(topology.links[0].target_interface.as_deref(), Some("port-1"));
    assert_eq!(topology.links[1].medium, LinkMedium::Wireless);
}

#[tokio::test]
async fn generic_devices_skip_mndp() {
    let agent = MemoryAgent::new()
        .with_column(oids::MNDP_NEIGHBOR_IDENTITY, [(vec![1], "hidden")])
        .with_column(oids::MNDP_NEIGHBOR_INTERFACE, [(vec![1], SnmpValue::Integer(1))]);
    let connector = MemoryConnector::new().with_agent("10.0.0.1", agent);
    let builder = TopologyBuilder::new(Arc::new(connector), 1);

    let topology = builder
        .build(&[DeviceDescriptor::new("edge", "10.0.0.1", DeviceFamily::EdgeRouter)])
        .await;
    assert!(topology.is_empty());
}

#[tokio::test]
async fn engine_discovery_keeps_manual_links_and_reports_load() {
    let agent = lldp_agent(&[(1, "sfp-sfpplus1")], &[(1, "switch", "port-1")])
        .with_column(oids::IF_OPER_STATUS, [(vec![1], SnmpValue::Integer(1))])
        .with_column(oids::IF_HC_IN_OCTETS, [(vec![1], SnmpValue::Counter64(10))])
        .with_column(oids::IF_HC_OUT_OCTETS, [(vec![1], SnmpValue::Counter64(20))]);
    let connector = MemoryConnector::new().with_agent("10.0.0.1", agent);

    let mut manual = Link::discovered("router", "ether5", "printer", None);
    manual.manual = true;
    let engine = PollingEngine::new(
        PollerConfig::default(),
        Arc::new(connector),
        Arc::new(MemoryStore::default()),
        Fleet {
            devices: vec![DeviceDescriptor::new("router", "10.0.0.1", DeviceFamily::Generic)],
            topology: Topology::new(vec![manual.clone()]),
        },
    );

    let topology = engine.discover().await;
    assert_eq!(
        summary(&topology.links),
        vec![("router", "ether5", "printer"), ("router", "sfp-sfpplus1", "switch")]
    );
    assert_eq!(engine.fleet().topology, topology);

    engine.run_cycle().await;
    let loads = engine.link_loads().unwrap();
    assert_eq!(loads.len(), 2);
    assert!(loads[0].status.is_none());
    assert_eq!(loads[1].link.medium, LinkMedium::TenGig);
    assert!(loads[1].status.is_some_and(|s| s.is_up()));
    assert!(loads[1].sampled_at.is_some());
}
