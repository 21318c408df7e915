use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::{
    CosmosHubAdapter, DriftPerpsAdapter, KavaFundingAdapter, ObolVaultAdapter,
};
use crate::{ModePolicy, SourceAdapter, SourceDescriptor, SourceId};

/// Registry of source adapters keyed by their stable ids.
///
/// Read-only after construction; batch tasks share it behind an `Arc`.
pub struct SourceRegistry {
    adapters: HashMap<SourceId, Arc<dyn SourceAdapter>>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(CosmosHubAdapter::default()),
            Arc::new(DriftPerpsAdapter::default()),
            Arc::new(KavaFundingAdapter::default()),
            Arc::new(ObolVaultAdapter::default()),
        ])
    }
}

impl SourceRegistry {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Self { adapters }
    }

    pub fn get(&self, source: &SourceId) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.get(source)
    }

    pub fn contains(&self, source: &SourceId) -> bool {
        self.adapters.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Caller-facing descriptor listing, composed with the mode policy.
    pub fn descriptors(&self, policy: &ModePolicy) -> Vec<SourceDescriptor> {
        let mut descriptors: Vec<SourceDescriptor> = self
            .adapters
            .values()
            .map(|adapter| SourceDescriptor {
                id: adapter.id(),
                display_name: adapter.display_name().to_owned(),
                mode: policy.mode_of(&adapter.id()),
                capabilities: adapter.capabilities(),
                requires_credentials: adapter.requires_credentials(),
            })
            .collect();
        descriptors.sort_by(|left, right| left.id.cmp(&right.id));
        descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mode;

    #[test]
    fn default_registry_contains_reference_adapters() {
        let registry = SourceRegistry::default();

        assert_eq!(registry.len(), 4);
        for id in ["cosmoshub", "driftperps", "kavafunding", "obolvault"] {
            assert!(registry.contains(&SourceId::parse(id).expect("valid id")));
        }
    }

    #[test]
    fn descriptors_are_sorted_and_carry_policy_modes() {
        let registry = SourceRegistry::default();
        let policy = ModePolicy::default_policy();

        let descriptors = registry.descriptors(&policy);
        let ids: Vec<&str> = descriptors
            .iter()
            .map(|descriptor| descriptor.id.as_str())
            .collect();
        assert_eq!(ids, vec!["cosmoshub", "driftperps", "kavafunding", "obolvault"]);

        let blocked = descriptors
            .iter()
            .find(|descriptor| descriptor.id.as_str() == "obolvault")
            .expect("obolvault is registered");
        assert_eq!(blocked.mode, Mode::Blocked);
        assert!(blocked.capabilities.is_empty());
    }
}
