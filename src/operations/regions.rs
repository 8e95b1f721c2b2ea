//! Regions (sites): `/regions`.

use serde::Deserialize;

use super::{run, Shape};
use crate::client::{ApiRequest, LatitudeClient};
use crate::error::OperationError;
use crate::normalize::ResultEnvelope;
use crate::params::{ApiParams, PageArgs};

const RESOURCE: &str = "Region";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRegionsArgs {
    #[serde(flatten)]
    pub page: PageArgs,
    pub filter_country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRegionArgs {
    pub region_id: String,
}

pub async fn list(
    client: &LatitudeClient,
    args: ListRegionsArgs,
) -> Result<ResultEnvelope, OperationError> {
    let mut params = ApiParams::new();
    let page = params.paginate(&args.page);
    params.filter("country", args.filter_country.as_deref());

    let request = ApiRequest::get("/regions", RESOURCE).params(params);
    run(client, request, Shape::Collection(page), || {
        "Failed to list regions".into()
    })
    .await
}

pub async fn get(
    client: &LatitudeClient,
    args: GetRegionArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::get(format!("/regions/{}", args.region_id), RESOURCE);
    run(client, request, Shape::Single, || {
        format!("Failed to fetch region {}", args.region_id)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_support::StubServer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn country_filter_reaches_the_wire() {
        let stub = StubServer::reply(200, r#"{"data":[]}"#).await;
        let client = LatitudeClient::new(&Config::for_test(&stub.url(), "k3y_value", 2_000)).unwrap();
        let args = ListRegionsArgs {
            page: PageArgs::default(),
            filter_country: Some("Brazil".into()),
        };

        let env = list(&client, args).await.unwrap();
        assert_eq!(env.data, json!([]));
        assert_eq!(env.meta, json!({ "total": 0, "page": 1, "limit": 20 }));

        let query = stub.request().await.query();
        assert!(query.contains(&("filter[country]".to_string(), "Brazil".to_string())));
    }

    #[tokio::test]
    async fn unknown_region_is_not_found() {
        let stub = StubServer::reply(404, r#"{"errors":[{"title":"Not Found"}]}"#).await;
        let client = LatitudeClient::new(&Config::for_test(&stub.url(), "k3y_value", 2_000)).unwrap();
        let err = get(&client, GetRegionArgs { region_id: "loc_zzz".into() })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch region loc_zzz: Region not found");
    }
}
