// ── Session seam ──
//
// The core only ever talks to agents through these two traits, so the
// wire backend can be swapped for the in-memory agent in tests.

use crate::error::Error;
use crate::oid::Oid;
use crate::transport::SessionConfig;
use crate::value::SnmpValue;

/// An open session against a single agent.
///
/// Sessions are blocking; async callers run them on the blocking pool.
pub trait Session: Send {
    /// Walk every row below `root`, calling `visit` with the row's index
    /// suffix and value in lexicographic OID order.
    ///
    /// Returns the number of rows visited. An error means the walk was cut
    /// short; rows already visited stay visited.
    fn walk(&mut self, root: &Oid, visit: &mut dyn FnMut(&[u32], SnmpValue))
    -> Result<usize, Error>;

    /// Fetch a single object. Absent objects are reported as
    /// [`Error::NoSuchObject`].
    fn get(&mut self, oid: &Oid) -> Result<SnmpValue, Error>;
}

/// Opens sessions. Shared across polling tasks.
pub trait Connector: Send + Sync {
    fn connect(&self, config: &SessionConfig) -> Result<Box<dyn Session>, Error>;
}
