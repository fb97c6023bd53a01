use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

/// The vehicle identifier as it appears in the raw trace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct VehicleName(pub String);

impl std::fmt::Display for VehicleName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vehicles are numbered in the order they're first seen in the trace. That order is also the
/// order lines are written for each time step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleID(pub usize);

impl CheapID for VehicleID {
    fn new(x: usize) -> Self {
        Self(x)
    }
}

pub trait CheapID: Copy {
    fn new(x: usize) -> Self;
}

pub struct IDMapping<K: Ord, V> {
    orig_to_cheap: BTreeMap<K, V>,
    // We don't need to store the inverse. It's more convenient for each object to own that.
}

impl<K: Clone + std::fmt::Debug + Ord, V: CheapID> IDMapping<K, V> {
    pub fn new() -> Self {
        Self {
            orig_to_cheap: BTreeMap::new(),
        }
    }

    /// Returns the ID and true if this is the first time `orig` was seen
    pub fn insert_idempotent(&mut self, orig: &K) -> (V, bool) {
        match self.orig_to_cheap.get(orig) {
            Some(x) => (*x, false),
            None => {
                let v = V::new(self.orig_to_cheap.len());
                self.orig_to_cheap.insert(orig.clone(), v);
                (v, true)
            }
        }
    }

    pub fn lookup(&self, orig: &K) -> Result<V> {
        match self.orig_to_cheap.get(orig) {
            Some(x) => Ok(*x),
            None => bail!("IDMapping lookup of {:?} failed", orig),
        }
    }

    pub fn len(&self) -> usize {
        self.orig_to_cheap.len()
    }
}
