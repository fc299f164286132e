// ── Owned varbind values ──
//
// Decoded values are copied out of the receive buffer so they outlive
// the request that produced them.

use std::net::Ipv4Addr;

use crate::oid::Oid;

/// An owned SNMP varbind value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    IpAddress(Ipv4Addr),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Counter64(u64),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Types this layer has no use for (opaque, nested sequences, …).
    Unsupported,
}

impl SnmpValue {
    /// `true` for the v2c exception markers that signal an absent value.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            Self::NoSuchObject | Self::NoSuchInstance | Self::EndOfMibView
        )
    }

    /// Text rendering of the value. Octet strings are decoded lossily.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::OctetString(bytes) => Some(
                String::from_utf8_lossy(bytes)
                    .trim_end_matches('\0')
                    .to_owned(),
            ),
            Self::Integer(v) => Some(v.to_string()),
            Self::Counter32(v) | Self::Gauge32(v) | Self::TimeTicks(v) => Some(v.to_string()),
            Self::Counter64(v) => Some(v.to_string()),
            Self::IpAddress(ip) => Some(ip.to_string()),
            Self::ObjectIdentifier(oid) => Some(oid.to_string()),
            Self::Null
            | Self::NoSuchObject
            | Self::NoSuchInstance
            | Self::EndOfMibView
            | Self::Unsupported => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Counter32(v) | Self::Gauge32(v) | Self::TimeTicks(v) => Some(i64::from(*v)),
            Self::Counter64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Unsigned rendering; counters of both widths widen to `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Counter64(v) => Some(*v),
            Self::Counter32(v) | Self::Gauge32(v) | Self::TimeTicks(v) => Some(u64::from(*v)),
            Self::Integer(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl From<&str> for SnmpValue {
    fn from(s: &str) -> Self {
        Self::OctetString(s.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octet_strings_render_as_text() {
        assert_eq!(SnmpValue::from("ether1").as_text().as_deref(), Some("ether1"));
        let padded = SnmpValue::OctetString(b"sfp1\0\0".to_vec());
        assert_eq!(padded.as_text().as_deref(), Some("sfp1"));
    }

    #[test]
    fn counters_widen() {
        assert_eq!(SnmpValue::Counter32(u32::MAX).as_u64(), Some(u64::from(u32::MAX)));
        assert_eq!(SnmpValue::Counter64(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(SnmpValue::Counter64(u64::MAX).as_i64(), None);
        assert_eq!(SnmpValue::Integer(-1).as_u64(), None);
    }

    #[test]
    fn absent_markers_have_no_value() {
        for v in [
            SnmpValue::NoSuchObject,
            SnmpValue::NoSuchInstance,
            SnmpValue::EndOfMibView,
        ] {
            assert!(v.is_absent());
            assert_eq!(v.as_text(), None);
            assert_eq!(v.as_u64(), None);
        }
    }
}
