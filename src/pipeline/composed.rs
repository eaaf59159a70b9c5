//! A composed policy: component policies nested around the transport send.

use std::sync::Arc;

use crate::http::transport::{PendingRequest, Response, Transport};
use crate::lifecycle::Cancellation;
use crate::resilience::{Next, Policy, PolicyKind, ResilienceResult};

/// Ordered layers, outermost first. Not mutated after construction.
///
/// The layers themselves may be shared with other composed policies
/// (the admission gate and token buckets must be).
#[derive(Debug, Clone, Default)]
pub struct ComposedPolicy {
    layers: Vec<Arc<dyn Policy>>,
}

impl ComposedPolicy {
    pub fn new(layers: Vec<Arc<dyn Policy>>) -> Self {
        Self { layers }
    }

    /// Layer kinds, outermost first.
    pub fn kinds(&self) -> Vec<PolicyKind> {
        self.layers.iter().map(|layer| layer.kind()).collect()
    }

    pub fn layers(&self) -> &[Arc<dyn Policy>] {
        &self.layers
    }

    /// The layer of the given kind, if present.
    pub fn get(&self, kind: PolicyKind) -> Option<&Arc<dyn Policy>> {
        self.layers.iter().find(|layer| layer.kind() == kind)
    }

    /// Whether both compositions hold the very same layer instances.
    pub fn same_layers(&self, layers: &[Arc<dyn Policy>]) -> bool {
        self.layers.len() == layers.len()
            && self
                .layers
                .iter()
                .zip(layers)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }

    /// Send `request` through every layer.
    pub async fn execute(
        &self,
        transport: &dyn Transport,
        request: &PendingRequest,
        cancellation: &Cancellation,
    ) -> ResilienceResult<Response> {
        Next::new(&self.layers, transport, request, cancellation)
            .run()
            .await
    }
}
