use super::Engine;

use async_trait::async_trait;

use crate::{
    api::HazardsAPI,
    entities::{Hazard, HazardReceipt, HazardReport},
    error::Error,
};

const MAX_VERIFIED_HAZARDS: u32 = 100;

#[async_trait]
impl HazardsAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn report_hazard(&self, report: HazardReport) -> Result<HazardReceipt, Error> {
        self.hazards.report_hazard(report).await
    }

    #[tracing::instrument(skip(self))]
    async fn verified_hazards(&self, limit: u32) -> Result<Vec<Hazard>, Error> {
        self.hazards
            .verified_hazards(limit.clamp(1, MAX_VERIFIED_HAZARDS))
            .await
    }
}
