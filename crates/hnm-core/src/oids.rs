// ── Object identifiers read by the sampler and the discovery walker ──

// IF-MIB
pub const IF_NAME: [u32; 11] = [1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1];
pub const IF_HC_IN_OCTETS: [u32; 11] = [1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6];
pub const IF_HC_OUT_OCTETS: [u32; 11] = [1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 10];
pub const IF_IN_OCTETS: [u32; 10] = [1, 3, 6, 1, 2, 1, 2, 2, 1, 10];
pub const IF_OUT_OCTETS: [u32; 10] = [1, 3, 6, 1, 2, 1, 2, 2, 1, 16];
pub const IF_OPER_STATUS: [u32; 10] = [1, 3, 6, 1, 2, 1, 2, 2, 1, 8];

// LLDP-MIB lldpRemTable, indexed by (timeMark, localPortNum, remIndex)
pub const LLDP_REM_PORT_ID: [u32; 11] = [1, 0, 8802, 1, 1, 2, 1, 4, 1, 1, 7];
pub const LLDP_REM_SYS_NAME: [u32; 11] = [1, 0, 8802, 1, 1, 2, 1, 4, 1, 1, 9];

// MIKROTIK-MIB mtxrNeighborTableEntry (MNDP)
pub const MNDP_NEIGHBOR_IDENTITY: [u32; 13] = [1, 3, 6, 1, 4, 1, 14988, 1, 1, 11, 1, 1, 6];
/// `mtxrNeighborInterfaceID`: the local ifIndex the neighbor was heard on.
pub const MNDP_NEIGHBOR_INTERFACE: [u32; 13] = [1, 3, 6, 1, 4, 1, 14988, 1, 1, 11, 1, 1, 8];
