use std::collections::BTreeMap;
use std::sync::Arc;

use crate::asset::Asset;

/// Name to loaded asset. Append-only until [`clear`](Self::clear).
#[derive(Debug, Default, Clone)]
pub struct LoadedAssetRegistry {
    items: BTreeMap<String, Arc<Asset>>,
    order: Vec<String>,
}

impl LoadedAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `asset` under `name`. A name that is already present is left
    /// untouched and `false` is returned.
    pub fn insert(&mut self, name: impl Into<String>, asset: Asset) -> bool {
        let name = name.into();
        if self.items.contains_key(&name) {
            tracing::warn!(%name, "asset already registered, ignoring");
            return false;
        }
        self.items.insert(name.clone(), Arc::new(asset));
        self.order.push(name);
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<Asset>> {
        self.items.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Names in the order they were stored.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Asset>)> {
        self.order
            .iter()
            .filter_map(|n| self.items.get(n).map(|a| (n.as_str(), a)))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ModelAsset;

    fn model(nodes: usize) -> Asset {
        Asset::Model(ModelAsset {
            meshes: Vec::new(),
            materials: Vec::new(),
            nodes,
            scenes: 1,
            animations: 0,
        })
    }

    #[test]
    fn insert_is_append_only() {
        let mut reg = LoadedAssetRegistry::new();
        assert!(reg.insert("duck", model(1)));
        assert!(!reg.insert("duck", model(2)));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("duck").unwrap().as_model().unwrap().nodes, 1);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut reg = LoadedAssetRegistry::new();
        reg.insert("zeta", model(0));
        reg.insert("alpha", model(0));
        let names: Vec<_> = reg.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn clear_empties_registry() {
        let mut reg = LoadedAssetRegistry::new();
        reg.insert("a", model(0));
        reg.clear();
        assert!(reg.is_empty());
        assert!(!reg.contains("a"));
        assert!(reg.insert("a", model(0)));
    }
}
