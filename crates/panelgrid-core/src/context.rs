//! Collaborators shared by the controllers

use crate::config::EngineConfig;
use crate::sampler::CoordinateSampler;
use crate::slots::WorkspaceSlots;
use crate::surface::LayoutPublisher;
use panelgrid_codec::{Codec, PixelFractionMap};
use panelgrid_store::{DurableStoreGateway, LocalCache, TemplateGridSizes, WorkspaceId};
use std::sync::Arc;

pub(crate) struct EngineContext {
    pub(crate) config: EngineConfig,
    pub(crate) codec: Arc<Codec>,
    pub(crate) local: LocalCache,
    pub(crate) durable: DurableStoreGateway,
    pub(crate) sampler: CoordinateSampler,
    pub(crate) publisher: Arc<dyn LayoutPublisher>,
    pub(crate) slots: WorkspaceSlots,
}

impl EngineContext {
    /// Strictly decode a stored record for the active topology
    ///
    /// A record for another topology, or one that fails validation, is absent.
    pub(crate) fn decode_record(
        &self,
        record: &TemplateGridSizes,
        topology_id: &str,
        source: &'static str,
    ) -> Option<PixelFractionMap> {
        if !record.is_for(topology_id) {
            tracing::debug!(
                workspace = %record.workspace_id,
                stored = %record.topology_id,
                topology = topology_id,
                source,
                "stored layout is for another topology"
            );
            return None;
        }
        match self.codec.try_decode(topology_id, &record.percentage_vector()) {
            Ok(map) => Some(map),
            Err(err) => {
                tracing::warn!(workspace = %record.workspace_id, topology = topology_id, source, error = %err, "ignoring malformed stored layout");
                None
            }
        }
    }

    pub(crate) fn publish(&self, workspace: &WorkspaceId, layout: &PixelFractionMap) {
        self.publisher.publish_layout(workspace, layout);
    }
}
