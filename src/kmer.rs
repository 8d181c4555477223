//! k-mer records
//!
//! A minimal record type for the table: a k-mer packed two bits per base,
//! plus the single-base extensions on either side that contig traversal
//! follows. `F` as an extension marks the start or end of a contig.

use crate::table::record::TableRecord;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Longest k-mer that fits the packed representation.
pub const MAX_K: usize = 32;

/// Extension marking the end of a contig.
pub const TERMINAL_EXT: char = 'F';

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "PackedKmer")]
pub struct Kmer {
    packed: u64,
    len: u8,
}

/// Wire form of a `Kmer`, checked before it becomes one.
#[derive(Deserialize)]
struct PackedKmer {
    packed: u64,
    len: u8,
}

impl TryFrom<PackedKmer> for Kmer {
    type Error = anyhow::Error;

    fn try_from(raw: PackedKmer) -> Result<Self> {
        let len = raw.len as usize;
        if len == 0 || len > MAX_K {
            anyhow::bail!("k-mer length must be in 1..={}, got {}", MAX_K, len);
        }
        if len < MAX_K && raw.packed >> (2 * len) != 0 {
            anyhow::bail!("Packed bits exceed a k-mer of length {}", len);
        }
        Ok(Self {
            packed: raw.packed,
            len: raw.len,
        })
    }
}

fn encode_base(base: char) -> Option<u64> {
    match base {
        'A' => Some(0),
        'C' => Some(1),
        'G' => Some(2),
        'T' => Some(3),
        _ => None,
    }
}

fn decode_base(bits: u64) -> char {
    match bits & 0b11 {
        0 => 'A',
        1 => 'C',
        2 => 'G',
        _ => 'T',
    }
}

impl Kmer {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 64-bit hash, identical on every participant for equal k-mers.
    pub fn hash_u64(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl FromStr for Kmer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.len() > MAX_K {
            anyhow::bail!("k-mer length must be in 1..={}, got {}", MAX_K, s.len());
        }
        let mut packed = 0u64;
        for base in s.chars() {
            let bits = encode_base(base)
                .ok_or_else(|| anyhow::anyhow!("Invalid base '{}' in k-mer {}", base, s))?;
            packed = (packed << 2) | bits;
        }
        Ok(Self {
            packed,
            len: s.len() as u8,
        })
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len()).rev() {
            write!(f, "{}", decode_base(self.packed >> (2 * i)))?;
        }
        Ok(())
    }
}

/// A k-mer with its backward and forward extensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct KmerPair {
    pub kmer: Kmer,
    pub backward_ext: char,
    pub forward_ext: char,
}

impl KmerPair {
    pub fn new(kmer: Kmer, backward_ext: char, forward_ext: char) -> Self {
        Self {
            kmer,
            backward_ext,
            forward_ext,
        }
    }

    /// First k-mer of a contig.
    pub fn is_start(&self) -> bool {
        self.backward_ext == TERMINAL_EXT
    }

    pub fn is_end(&self) -> bool {
        self.forward_ext == TERMINAL_EXT
    }
}

impl TableRecord for KmerPair {
    type Key = Kmer;

    fn key(&self) -> &Kmer {
        &self.kmer
    }

    fn hash_key(key: &Kmer) -> u64 {
        key.hash_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kmer_parse_and_display() {
        let kmer: Kmer = "GATTACA".parse().unwrap();

        assert_eq!(kmer.len(), 7);
        assert_eq!(kmer.to_string(), "GATTACA");
    }

    #[test]
    fn test_kmer_rejects_invalid_input() {
        assert!("".parse::<Kmer>().is_err());
        assert!("ACGN".parse::<Kmer>().is_err());
        assert!("A".repeat(MAX_K + 1).parse::<Kmer>().is_err());
        assert!("A".repeat(MAX_K).parse::<Kmer>().is_ok());
    }

    #[test]
    fn test_deserialize_rejects_malformed_kmer() {
        assert!(serde_json::from_str::<Kmer>(r#"{"packed":0,"len":200}"#).is_err());
        assert!(serde_json::from_str::<Kmer>(r#"{"packed":0,"len":0}"#).is_err());
        // Three bases leave no room for bits above position six.
        assert!(serde_json::from_str::<Kmer>(r#"{"packed":64,"len":3}"#).is_err());

        let kmer: Kmer = serde_json::from_str(r#"{"packed":6,"len":3}"#).unwrap();
        assert_eq!(kmer.to_string(), "ACG");
    }

    #[test]
    fn test_length_is_part_of_identity() {
        // Leading A's pack to zero bits; the length keeps them apart.
        let short: Kmer = "CG".parse().unwrap();
        let long: Kmer = "ACG".parse().unwrap();

        assert_ne!(short, long);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a: Kmer = "ACGTACGTAC".parse().unwrap();
        let b: Kmer = "ACGTACGTAC".parse().unwrap();

        assert_eq!(KmerPair::hash_key(&a), KmerPair::hash_key(&b));
    }

    #[test]
    fn test_terminal_extensions() {
        let kmer: Kmer = "ACG".parse().unwrap();

        let start = KmerPair::new(kmer, TERMINAL_EXT, 'T');
        assert!(start.is_start());
        assert!(!start.is_end());

        let end = KmerPair::new(kmer, 'C', TERMINAL_EXT);
        assert!(end.is_end());
        assert_eq!(end.key(), &kmer);
    }

    #[test]
    fn test_pair_serialization() {
        let pair = KmerPair::new("TTGCA".parse().unwrap(), 'A', 'F');

        let json = serde_json::to_string(&pair).expect("Serialization failed");
        let restored: KmerPair = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(restored, pair);
    }
}
