use std::fmt::{self, Write};

use sha2::{Digest as _, Sha256};

use crate::value::Value;

/// A SHA-256 digest over a subset of the entries of a [`Store`](crate::Store).
///
/// SHA-256 collisions are treated as impossible: two stores with the same digest for a set of
/// groups are considered equal with regard to those groups.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

/// A builder for [`Digest`]s.
///
/// Entries are written in a stable, human readable form which is then hashed. Callers are
/// responsible for writing entries in a deterministic order.
#[derive(Debug, Default)]
pub(crate) struct DigestBuilder {
    metadata: String,
}

impl DigestBuilder {
    /// Writes a single `(key, value)` entry.
    pub fn write_entry(&mut self, key: &str, value: &Value) -> fmt::Result {
        write!(self.metadata, "{}:{key}=", key.len())?;
        value.write_canonical(&mut self.metadata)?;
        self.metadata.write_char('\n')
    }

    /// Writes the digest of a whole group.
    pub fn write_group(&mut self, group: &str, digest: &Digest) -> fmt::Result {
        writeln!(self.metadata, "{}:{group}#{digest}", group.len())
    }

    pub fn build(self) -> Digest {
        Digest(Sha256::digest(&self.metadata).into())
    }
}
