// ── Device sampler ──
//
// One blocking poll of one device: open a session, walk the interface
// tables, join them by ifIndex. Rates are left at zero; the tracker
// fills them in.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hnm_snmp::{Connector, Oid, Session, SnmpValue};
use tracing::{debug, info, trace, warn};

use crate::error::CoreError;
use crate::model::{DeviceDescriptor, InterfaceSample, OperStatus};
use crate::oids;

type Column<T> = BTreeMap<u32, T>;

/// Reads interface counters from devices through a [`Connector`].
#[derive(Clone)]
pub struct DeviceSampler {
    connector: Arc<dyn Connector>,
}

impl DeviceSampler {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Poll `device` now. Blocks for up to the session timeout times the
    /// retry budget per request.
    pub fn poll(&self, device: &DeviceDescriptor) -> Result<Vec<InterfaceSample>, CoreError> {
        self.poll_at(device, Utc::now())
    }

    /// Poll `device`, stamping every sample with `timestamp`.
    pub fn poll_at(
        &self,
        device: &DeviceDescriptor,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<InterfaceSample>, CoreError> {
        let mut session = self.connector.connect(&device.session_config())?;
        let session = session.as_mut();

        let names = match walk_column(session, &oids::IF_NAME.into(), SnmpValue::as_text) {
            Ok(names) => names,
            Err(e) => {
                warn!(device = %device.name, error = %e, "ifName walk failed, using placeholder names");
                Column::new()
            }
        };

        let statuses = walk_column(session, &oids::IF_OPER_STATUS.into(), |v| {
            v.as_i64().map(OperStatus::from_if_oper_status)
        })
        .unwrap_or_else(|e| {
            debug!(device = %device.name, error = %e, "ifOperStatus walk failed");
            Column::new()
        });

        let reported_interfaces = !names.is_empty() || !statuses.is_empty();
        let (in_octets, out_octets) = match read_hc_counters(session, reported_interfaces) {
            Ok(counters) => counters,
            Err(reason) => {
                info!(device = %device.name, %reason, "falling back to 32-bit counters");
                (
                    walk_column(session, &oids::IF_IN_OCTETS.into(), SnmpValue::as_u64)?,
                    walk_column(session, &oids::IF_OUT_OCTETS.into(), SnmpValue::as_u64)?,
                )
            }
        };

        let samples: Vec<InterfaceSample> = in_octets
            .iter()
            .filter_map(|(&index, &in_octets)| {
                let Some(&out_octets) = out_octets.get(&index) else {
                    debug!(
                        device = %device.name,
                        index,
                        "inbound counter without outbound counter, interface skipped"
                    );
                    return None;
                };
                let interface = names
                    .get(&index)
                    .filter(|name| !name.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("if-{index}"));
                Some(InterfaceSample {
                    device: device.name.clone(),
                    interface,
                    index,
                    timestamp,
                    in_octets,
                    out_octets,
                    in_bps: 0.0,
                    out_bps: 0.0,
                    status: statuses.get(&index).copied().unwrap_or(OperStatus::Down),
                })
            })
            .collect();

        debug!(device = %device.name, interfaces = samples.len(), "poll complete");
        Ok(samples)
    }
}

/// 64-bit counters, or the reason they cannot be used.
fn read_hc_counters(
    session: &mut dyn Session,
    reported_interfaces: bool,
) -> Result<(Column<u64>, Column<u64>), String> {
    let in_octets = walk_column(session, &oids::IF_HC_IN_OCTETS.into(), SnmpValue::as_u64)
        .map_err(|e| e.to_string())?;
    if in_octets.is_empty() && reported_interfaces {
        return Err("ifHCInOctets is empty".into());
    }
    let out_octets = walk_column(session, &oids::IF_HC_OUT_OCTETS.into(), SnmpValue::as_u64)
        .map_err(|e| e.to_string())?;
    if out_octets.is_empty() && reported_interfaces {
        return Err("ifHCOutOctets is empty".into());
    }
    Ok((in_octets, out_octets))
}

/// Walk a single-index table column into `ifIndex -> value`.
///
/// Rows whose value does not convert, or whose index is not a single
/// component, are skipped.
fn walk_column<T>(
    session: &mut dyn Session,
    root: &Oid,
    convert: impl Fn(&SnmpValue) -> Option<T>,
) -> Result<Column<T>, hnm_snmp::Error> {
    let mut column = Column::new();
    let rows = session.walk(root, &mut |index: &[u32], value: SnmpValue| {
        match (index, convert(&value)) {
            ([if_index], Some(v)) => {
                column.insert(*if_index, v);
            }
            _ => trace!(%root, ?index, "skipping row"),
        }
    })?;
    debug!(%root, rows, kept = column.len(), "walked column");
    Ok(column)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use chrono::TimeZone;
    use hnm_snmp::{MemoryAgent, MemoryConnector};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::DeviceFamily;

    fn device() -> DeviceDescriptor {
        DeviceDescriptor::new("core", "10.0.0.1", DeviceFamily::MikroTik)
    }

    fn sampler(agent: MemoryAgent) -> DeviceSampler {
        DeviceSampler::new(Arc::new(MemoryConnector::new().with_agent("10.0.0.1", agent)))
    }

    fn base_agent() -> MemoryAgent {
        MemoryAgent::new()
            .with_column(
                oids::IF_NAME,
                [(vec![1], "ether1"), (vec![2], "sfp-sfpplus1")],
            )
            .with_column(
                oids::IF_OPER_STATUS,
                [(vec![1], SnmpValue::Integer(1)), (vec![2], SnmpValue::Integer(2))],
            )
    }

    fn hc_agent() -> MemoryAgent {
        base_agent()
            .with_column(
                oids::IF_HC_IN_OCTETS,
                [
                    (vec![1], SnmpValue::Counter64(1000)),
                    (vec![2], SnmpValue::Counter64(5_000_000_000)),
                ],
            )
            .with_column(
                oids::IF_HC_OUT_OCTETS,
                [(vec![1], SnmpValue::Counter64(2000)), (vec![2], SnmpValue::Counter64(7))],
            )
            .with_column(
                oids::IF_IN_OCTETS,
                [(vec![1], SnmpValue::Counter32(1)), (vec![2], SnmpValue::Counter32(2))],
            )
            .with_column(
                oids::IF_OUT_OCTETS,
                [(vec![1], SnmpValue::Counter32(3)), (vec![2], SnmpValue::Counter32(4))],
            )
    }

    fn legacy_columns(agent: MemoryAgent) -> MemoryAgent {
        agent
            .with_column(
                oids::IF_IN_OCTETS,
                [(vec![1], SnmpValue::Counter32(111)), (vec![2], SnmpValue::Counter32(222))],
            )
            .with_column(
                oids::IF_OUT_OCTETS,
                [(vec![1], SnmpValue::Counter32(333)), (vec![2], SnmpValue::Counter32(444))],
            )
    }

    fn octets(samples: &[InterfaceSample]) -> Vec<(String, u64, u64)> {
        samples
            .iter()
            .map(|s| (s.interface.clone(), s.in_octets, s.out_octets))
            .collect()
    }

    #[test]
    fn joins_tables_by_index() {
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let samples = sampler(hc_agent()).poll_at(&device(), t).unwrap();

        assert_eq!(
            octets(&samples),
            vec![
                ("ether1".to_owned(), 1000, 2000),
                ("sfp-sfpplus1".to_owned(), 5_000_000_000, 7),
            ]
        );
        assert_eq!(samples[0].status, OperStatus::Up);
        assert_eq!(samples[1].status, OperStatus::Down);
        assert!(samples.iter().all(|s| s.timestamp == t && s.device == "core"));
        assert!(samples.iter().all(|s| s.in_bps == 0.0 && s.out_bps == 0.0));
    }

    #[test]
    fn failing_hc_walk_falls_back_to_32_bit() {
        let agent = legacy_columns(base_agent()).failing_walk(oids::IF_HC_IN_OCTETS);
        let samples = sampler(agent).poll(&device()).unwrap();
        assert_eq!(
            octets(&samples),
            vec![
                ("ether1".to_owned(), 111, 333),
                ("sfp-sfpplus1".to_owned(), 222, 444),
            ]
        );
    }

    #[test]
    fn empty_hc_table_falls_back_to_32_bit() {
        let agent = legacy_columns(base_agent());
        let samples = sampler(agent).poll(&device()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].in_octets, 111);
    }

    #[test]
    fn nameless_index_gets_placeholder() {
        let agent = hc_agent()
            .with(Oid::from(oids::IF_HC_IN_OCTETS).join(&[7]), SnmpValue::Counter64(5))
            .with(Oid::from(oids::IF_HC_OUT_OCTETS).join(&[7]), SnmpValue::Counter64(6));
        let samples = sampler(agent).poll(&device()).unwrap();

        let extra = samples.iter().find(|s| s.index == 7).unwrap();
        assert_eq!(extra.interface, "if-7");
        assert_eq!(extra.status, OperStatus::Down);
    }

    #[test]
    fn name_walk_failure_is_not_fatal() {
        let agent = hc_agent().failing_walk(oids::IF_NAME);
        let samples = sampler(agent).poll(&device()).unwrap();
        let names: Vec<_> = samples.iter().map(|s| s.interface.as_str()).collect();
        assert_eq!(names, vec!["if-1", "if-2"]);
    }

    #[test]
    fn index_without_both_counters_is_dropped() {
        let agent = base_agent()
            .with_column(
                oids::IF_HC_IN_OCTETS,
                [(vec![1], SnmpValue::Counter64(1)), (vec![2], SnmpValue::Counter64(2))],
            )
            .with_column(oids::IF_HC_OUT_OCTETS, [(vec![1], SnmpValue::Counter64(3))]);
        let samples = sampler(agent).poll(&device()).unwrap();
        assert_eq!(octets(&samples), vec![("ether1".to_owned(), 1, 3)]);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn dropped_index_is_logged_at_debug() {
        let agent = base_agent()
            .with_column(
                oids::IF_HC_IN_OCTETS,
                [(vec![1], SnmpValue::Counter64(1)), (vec![2], SnmpValue::Counter64(2))],
            )
            .with_column(oids::IF_HC_OUT_OCTETS, [(vec![1], SnmpValue::Counter64(3))]);
        let logs = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();

        let samples = tracing::subscriber::with_default(subscriber, || {
            sampler(agent).poll(&device()).unwrap()
        });
        assert_eq!(samples.len(), 1);

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = text
            .lines()
            .find(|l| l.contains("without outbound counter"))
            .unwrap();
        assert!(line.contains("DEBUG"), "{line}");
        assert!(line.contains("device=core"), "{line}");
        assert!(line.contains("index=2"), "{line}");
    }

    #[test]
    fn unreachable_device_is_an_error() {
        let sampler = DeviceSampler::new(Arc::new(MemoryConnector::new()));
        let err = sampler.poll(&device()).unwrap_err();
        assert!(err.is_unreachable());
    }

    #[test]
    fn missing_legacy_tables_fail_the_poll() {
        let agent = base_agent()
            .failing_walk(oids::IF_HC_IN_OCTETS)
            .failing_walk(oids::IF_IN_OCTETS);
        let err = sampler(agent).poll(&device()).unwrap_err();
        assert!(matches!(err, CoreError::Walk { .. }));
    }
}
