//! Identifiers for transactions and simulated nodes
//!
//! See the documentation of [TxId] and [NodeId] for details.

use std::fmt;
use std::str::FromStr;

/// Hash-based identifier of a transaction
///
/// The `TxId` wraps a 32-byte blake3 hash. Ids are displayed as hex, `Debug` uses a
/// short 5-byte prefix which is enough to tell vertices apart in logs.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize, Default)]
pub struct TxId([u8; 32]);

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &hex::encode(self.0)[..10])
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for TxId {
    type Err = crate::Error;

    /// Converts a hex encoded string to a `TxId`
    fn from_str(id_str: &str) -> Result<Self, crate::Error> {
        let bytes = hex::decode(id_str).map_err(|_| crate::Error::TryFromStringError)?;
        if bytes.len() != 32 {
            return Err(crate::Error::TryFromStringError);
        }
        let mut buf = [0u8; 32];
        buf.copy_from_slice(&bytes);
        Ok(TxId(buf))
    }
}

impl TxId {
    /// Creates a new id by hashing an input byte slice
    pub fn new(bytes: &[u8]) -> TxId {
        TxId(*blake3::hash(bytes).as_bytes())
    }

    /// Sets the bytes of an id explicitly (expects a hash)
    pub fn from_hash(bytes: [u8; 32]) -> TxId {
        TxId(bytes)
    }

    /// All-zeroes `TxId` (for testing)
    pub fn zero() -> TxId {
        TxId([0u8; 32])
    }

    /// Returns a slice to the contained byte array
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Index of a simulated node in its [Network][crate::network::Network]
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize, Default)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

impl NodeId {
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tx_id_hex_roundtrip() {
        let id = TxId::new(b"genesis");
        let parsed: TxId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert_eq!(format!("{:?}", id).len(), 10);
    }

    #[test]
    fn test_tx_id_rejects_short_input() {
        assert!("abcd".parse::<TxId>().is_err());
        assert!("not hex".parse::<TxId>().is_err());
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(7).to_string(), "node-7");
    }
}
