//! Append-only string interner standing in for the host's string table.
//!
//! Grounded on `gc/string_interner.rs`'s ahash-keyed `HashMap<u64, _>`
//! design, trimmed of its GC resurrection logic: the spec's ownership
//! model says interned strings are "owned by the host's string table and
//! live at least as long as the container", so this interner never frees
//! an entry once interned.

use ahash::RandomState;
use smol_str::SmolStr;
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name(u32);

impl core::fmt::Debug for Name {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

pub struct Interner {
    strings: Vec<SmolStr>,
    by_hash: HashMap<u64, Vec<u32>, RandomState>,
    hasher: RandomState,
}

impl Interner {
    pub fn new() -> Self {
        Interner {
            strings: Vec::new(),
            by_hash: HashMap::default(),
            hasher: RandomState::new(),
        }
    }

    pub fn intern(&mut self, text: &str) -> Name {
        use std::hash::{BuildHasher, Hash, Hasher};
        let mut hasher = self.hasher.build_hasher();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        if let Some(candidates) = self.by_hash.get(&hash) {
            for &index in candidates {
                if self.strings[index as usize].as_str() == text {
                    return Name(index);
                }
            }
        }

        let index = self.strings.len() as u32;
        self.strings.push(SmolStr::new(text));
        self.by_hash.entry(hash).or_default().push(index);
        Name(index)
    }

    pub fn resolve(&self, name: Name) -> &str {
        self.strings[name.0 as usize].as_str()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Interner::new()
    }
}
