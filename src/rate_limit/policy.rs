use super::types::EndpointPolicy;
use std::collections::HashMap;

/// Static endpoint-name -> policy table, seeded at startup and never
/// mutated afterwards. Lookups are exact-match; an unknown endpoint name is
/// a distinct outcome (`None`), not an error.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    policies: HashMap<String, EndpointPolicy>,
}

impl PolicyTable {
    /// Build a policy table from configured entries
    pub fn new(policies: impl IntoIterator<Item = EndpointPolicy>) -> Self {
        Self {
            policies: policies
                .into_iter()
                .map(|p| (p.endpoint.clone(), p))
                .collect(),
        }
    }

    /// Look up the policy for an endpoint name
    pub fn get(&self, endpoint: &str) -> Option<&EndpointPolicy> {
        self.policies.get(endpoint)
    }

    /// Number of configured policies
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the table has no policies
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
