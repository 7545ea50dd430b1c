use crate::broker::tag;
use crate::provider::Provider;
use dashmap::DashMap;
use std::sync::Arc;

pub const WILDCARD: &str = "*";

/// Per-language provider preferences.
#[derive(Default)]
pub struct OrderingTable {
    preferences: DashMap<String, Vec<String>>,
}

impl OrderingTable {
    pub fn set(&self, tag: &str, ordering: &str) {
        let names = parse(ordering);
        self.preferences.insert(tag.to_string(), names);
    }

    /// Preferred names for a tag: exact match, then base language, then `*`.
    pub fn preferred(&self, tag: &str) -> Vec<String> {
        tag::candidates(tag)
            .into_iter()
            .chain(std::iter::once(WILDCARD))
            .find_map(|key| self.preferences.get(key).map(|names| names.value().clone()))
            .unwrap_or_default()
    }

    /// Preferred providers first, then the rest in discovery order.
    /// Names without a matching provider are ignored.
    pub fn arrange(&self, tag: &str, providers: &[Arc<dyn Provider>]) -> Vec<Arc<dyn Provider>> {
        let mut ordered: Vec<Arc<dyn Provider>> = Vec::with_capacity(providers.len());

        for name in self.preferred(tag) {
            if let Some(provider) = providers.iter().find(|p| p.info().name == name) {
                if !ordered.iter().any(|o| Arc::ptr_eq(o, provider)) {
                    ordered.push(Arc::clone(provider));
                }
            }
        }
        for provider in providers {
            if !ordered.iter().any(|o| Arc::ptr_eq(o, provider)) {
                ordered.push(Arc::clone(provider));
            }
        }

        ordered
    }
}

fn parse(ordering: &str) -> Vec<String> {
    ordering
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
