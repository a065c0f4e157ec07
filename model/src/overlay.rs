use std::collections::BTreeMap;

/// Worker pools keyed by pool name. A `None` entry is a well-known pool the source cluster does
/// not have; the downstream system will not create it. The map is ordered so serialized output
/// is sorted by pool name.
pub type WorkerPools<W> = BTreeMap<String, Option<W>>;

/// Builds a [`WorkerPools`] map from a fixed set of well-known pool names and the pools found
/// during discovery.
///
/// Discovered pools replace the placeholder of the same name outright; nothing from a previous
/// entry survives. Pools with names outside the well-known set are added.
#[derive(Debug, Clone)]
pub struct PoolOverlay<W> {
    pools: WorkerPools<W>,
}

impl<W> PoolOverlay<W> {
    pub fn seeded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pools: names.into_iter().map(|name| (name.into(), None)).collect(),
        }
    }

    pub fn discovered<S: Into<String>>(&mut self, name: S, worker: W) -> &mut Self {
        self.pools.insert(name.into(), Some(worker));
        self
    }

    pub fn into_pools(self) -> WorkerPools<W> {
        self.pools
    }
}
