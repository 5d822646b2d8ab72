use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;

use crate::{
    api::HazardsAPI,
    entities::{Hazard, HazardReceipt, HazardReport},
    error::{fetch_failed_error, invalid_input_error, Error},
};

/// Driver endpoints of the SafeRoute hazard backend.
#[derive(Clone, Debug)]
pub struct SafeRouteHazards {
    client: reqwest::Client,
    api_base: String,
}

impl SafeRouteHazards {
    pub fn new(api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

fn check_status(status: StatusCode) -> Result<(), Error> {
    if status.is_client_error() {
        return Err(invalid_input_error());
    } else if !status.is_success() {
        return Err(fetch_failed_error());
    }

    Ok(())
}

#[async_trait]
impl HazardsAPI for SafeRouteHazards {
    #[tracing::instrument(skip(self))]
    async fn report_hazard(&self, report: HazardReport) -> Result<HazardReceipt, Error> {
        report.validate(Utc::now())?;

        let url = format!("{}/hazards/report", self.api_base);
        let res = self.client.post(url).json(&report).send().await?;

        check_status(res.status())?;

        let receipt: HazardReceipt = res.json().await?;
        tracing::info!("hazard {} reported", receipt.hazard_id);

        Ok(receipt)
    }

    #[tracing::instrument(skip(self))]
    async fn verified_hazards(&self, limit: u32) -> Result<Vec<Hazard>, Error> {
        let url = format!("{}/hazards/verified", self.api_base);
        let res = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        check_status(res.status())?;

        Ok(res.json().await?)
    }
}

#[test]
fn status_mapping_test() {
    assert!(check_status(StatusCode::CREATED).is_ok());
    assert_eq!(
        check_status(StatusCode::UNPROCESSABLE_ENTITY).unwrap_err(),
        invalid_input_error()
    );
    assert!(check_status(StatusCode::SERVICE_UNAVAILABLE)
        .unwrap_err()
        .is_fetch_failed());
}

#[test]
fn invalid_report_never_leaves_the_client() {
    use crate::entities::{GeoPoint, HazardType};
    use chrono::Duration;
    use tokio_test::block_on;

    // unroutable base: any request attempt would surface as a fetch failure
    let hazards = SafeRouteHazards::new("http://127.0.0.1:9/".into());
    let report = HazardReport::new(
        HazardType::Accident,
        GeoPoint { lat: 43.0, lng: -71.5 },
        Utc::now() + Duration::hours(2),
    );

    let err = block_on(hazards.report_hazard(report)).unwrap_err();

    assert_eq!(err, invalid_input_error());
}
