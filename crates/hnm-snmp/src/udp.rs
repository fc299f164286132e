// ── UDP backend ──
//
// SNMPv2c over UDP via the `snmp` crate. Every request is retried up to
// the configured budget; walks are driven with GETBULK.

use std::net::Ipv4Addr;

use secrecy::ExposeSecret;
use snmp::{SnmpError, SnmpPdu, SyncSession, Value};
use tracing::{debug, trace};

use crate::error::Error;
use crate::oid::Oid;
use crate::session::{Connector, Session};
use crate::transport::SessionConfig;
use crate::value::SnmpValue;

const MAX_REPETITIONS: u32 = 16;

/// Opens SNMPv2c sessions over UDP.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpConnector;

impl Connector for UdpConnector {
    fn connect(&self, config: &SessionConfig) -> Result<Box<dyn Session>, Error> {
        let target = config.target();
        let inner = SyncSession::new(
            (config.host.as_str(), config.port),
            config.community.expose_secret().as_bytes(),
            Some(config.timeout),
            0,
        )
        .map_err(|e| Error::Connect {
            target: target.clone(),
            reason: e.to_string(),
        })?;

        debug!(%target, "session opened");
        Ok(Box::new(UdpSession {
            inner,
            target,
            attempts: config.attempts(),
        }))
    }
}

struct UdpSession {
    inner: SyncSession,
    target: String,
    attempts: u32,
}

#[derive(Clone, Copy)]
enum Request<'a> {
    Get(&'a Oid),
    Bulk(&'a Oid),
}

impl Request<'_> {
    fn oid(&self) -> &Oid {
        match self {
            Self::Get(oid) | Self::Bulk(oid) => oid,
        }
    }
}

impl UdpSession {
    /// Send one request, retrying on failure, and copy the varbinds out.
    fn exchange(&mut self, request: Request<'_>) -> Result<Vec<(Oid, SnmpValue)>, Error> {
        let mut timed_out = false;
        let mut reason = String::new();

        for attempt in 1..=self.attempts {
            let result = match request {
                Request::Get(oid) => self.inner.get(oid.as_slice()),
                Request::Bulk(oid) => {
                    self.inner
                        .getbulk(&[oid.as_slice()], 0, MAX_REPETITIONS)
                }
            };
            match result {
                Ok(pdu) => return decode(pdu, request.oid()),
                Err(e) => {
                    debug!(
                        target = %self.target,
                        oid = %request.oid(),
                        attempt,
                        error = ?e,
                        "request failed"
                    );
                    timed_out = matches!(e, SnmpError::ReceiveError);
                    reason = format!("{e:?}");
                }
            }
        }

        if timed_out {
            Err(Error::Timeout {
                target: self.target.clone(),
                attempts: self.attempts,
            })
        } else {
            Err(Error::Request {
                target: self.target.clone(),
                reason,
            })
        }
    }
}

impl Session for UdpSession {
    fn walk(
        &mut self,
        root: &Oid,
        visit: &mut dyn FnMut(&[u32], SnmpValue),
    ) -> Result<usize, Error> {
        let mut cursor = root.clone();
        let mut visited = 0;

        loop {
            let rows = self.exchange(Request::Bulk(&cursor))?;
            if rows.is_empty() {
                return Ok(visited);
            }

            for (oid, value) in rows {
                let Some(index) = oid.strip_prefix(root) else {
                    // Walked past the end of the table.
                    return Ok(visited);
                };
                if oid <= cursor {
                    return Err(Error::WalkLoop {
                        root: root.to_string(),
                        oid: oid.to_string(),
                    });
                }
                trace!(%oid, ?value, "walk row");
                visit(index, value);
                visited += 1;
                cursor = oid;
            }
        }
    }

    fn get(&mut self, oid: &Oid) -> Result<SnmpValue, Error> {
        let rows = self.exchange(Request::Get(oid))?;
        match rows.into_iter().next() {
            Some((_, value)) if !value.is_absent() => Ok(value),
            _ => Err(Error::NoSuchObject {
                oid: oid.to_string(),
            }),
        }
    }
}

/// Copy the varbinds out of a response.
///
/// The `snmp` crate has no representation for the v2 exception values
/// (`noSuchObject`, `noSuchInstance`, `endOfMibView`): its varbind iterator
/// stops at the first one. An absent GET therefore decodes to no rows and
/// a bulk page past the end of the MIB view decodes to an empty or short
/// page, which `get` and `walk` treat as absence and end of walk.
fn decode(pdu: SnmpPdu<'_>, requested: &Oid) -> Result<Vec<(Oid, SnmpValue)>, Error> {
    if pdu.error_status != 0 {
        return Err(Error::Protocol {
            oid: requested.to_string(),
            status: pdu.error_status,
        });
    }

    let mut rows = Vec::new();
    let mut buf = [0u32; 128];
    for (name, value) in pdu.varbinds {
        // Undecodable names end the response early rather than failing it.
        let Ok(arcs) = name.read_name(&mut buf) else {
            break;
        };
        rows.push((Oid::from(arcs), convert(value)));
    }
    Ok(rows)
}

fn convert(value: Value<'_>) -> SnmpValue {
    match value {
        Value::Integer(v) => SnmpValue::Integer(v),
        Value::OctetString(bytes) => SnmpValue::OctetString(bytes.to_vec()),
        Value::ObjectIdentifier(oid) => {
            let mut buf = [0u32; 128];
            oid.read_name(&mut buf)
                .map_or(SnmpValue::Unsupported, |arcs| {
                    SnmpValue::ObjectIdentifier(Oid::from(arcs))
                })
        }
        Value::IpAddress(octets) => SnmpValue::IpAddress(Ipv4Addr::from(octets)),
        Value::Counter32(v) => SnmpValue::Counter32(v),
        Value::Unsigned32(v) => SnmpValue::Gauge32(v),
        Value::Timeticks(v) => SnmpValue::TimeTicks(v),
        Value::Counter64(v) => SnmpValue::Counter64(v),
        Value::Null => SnmpValue::Null,
        _ => SnmpValue::Unsupported,
    }
}
