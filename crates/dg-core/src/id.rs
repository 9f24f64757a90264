use lasso::{Spur, ThreadedRodeo};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for scene identifiers. Cheap to compare and hash.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for nodes, connection points and link pairs.
/// Internally a 4-byte `Spur` index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a new string as a NodeId, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

/// Category tag prepended to generated identifiers (`n:…`, `p:…`, `pr:…`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPrefix {
    Node,
    Point,
    Pair,
}

impl IdPrefix {
    fn as_str(self) -> &'static str {
        match self {
            IdPrefix::Node => "n",
            IdPrefix::Point => "p",
            IdPrefix::Pair => "pr",
        }
    }
}

const SUFFIX_LEN: usize = 12;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_-";

/// Hands out fresh identifiers for a single operation (one duplication call).
///
/// The allocator is seeded once and never reuses an identifier it has
/// produced or one listed in `taken`, so there is no process-wide counter.
pub struct IdAllocator {
    rng: StdRng,
    taken: HashSet<NodeId>,
}

impl IdAllocator {
    /// Allocator seeded from OS entropy. `taken` holds every id already in use.
    pub fn new(taken: HashSet<NodeId>) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            taken,
        }
    }

    /// Deterministic allocator for reproducible runs.
    pub fn seeded(seed: u64, taken: HashSet<NodeId>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            taken,
        }
    }

    /// Generate an identifier that collides with nothing seen so far.
    pub fn fresh(&mut self, prefix: IdPrefix) -> NodeId {
        loop {
            let suffix: String = (0..SUFFIX_LEN)
                .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char)
                .collect();
            let id = NodeId::intern(&format!("{}:{suffix}", prefix.as_str()));
            if self.taken.insert(id) {
                return id;
            }
        }
    }

    /// Whether `id` is already reserved.
    pub fn is_taken(&self, id: NodeId) -> bool {
        self.taken.contains(&id)
    }
}
