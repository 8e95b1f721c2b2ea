//! Plan catalogue: `/plans` and `/plans/operating_systems`.

use serde::Deserialize;

use super::{run, Shape};
use crate::client::{ApiRequest, LatitudeClient};
use crate::error::OperationError;
use crate::normalize::ResultEnvelope;
use crate::params::{ApiParams, HardwareRanges, Page, PageArgs};

const RESOURCE: &str = "Plan";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansArgs {
    #[serde(flatten)]
    pub page: PageArgs,
    #[serde(flatten)]
    pub ranges: HardwareRanges,
    pub filter_name: Option<String>,
    pub filter_slug: Option<String>,
    pub filter_location: Option<String>,
    pub filter_stock_level: Option<String>,
    pub filter_in_stock: Option<bool>,
    pub filter_gpu: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPlanArgs {
    pub plan_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOperatingSystemsArgs {
    #[serde(flatten)]
    pub page: PageArgs,
}

pub fn list_params(args: &ListPlansArgs) -> (ApiParams, Page) {
    let mut params = ApiParams::new();
    let page = params.paginate(&args.page);
    params.filter("name", args.filter_name.as_deref());
    params.filter("slug", args.filter_slug.as_deref());
    params.filter("location", args.filter_location.as_deref());
    params.filter("stock_level", args.filter_stock_level.as_deref());
    params.filter("in_stock", args.filter_in_stock);
    params.filter("gpu", args.filter_gpu);
    args.ranges.apply(&mut params);
    (params, page)
}

pub async fn list(
    client: &LatitudeClient,
    args: ListPlansArgs,
) -> Result<ResultEnvelope, OperationError> {
    let (params, page) = list_params(&args);
    let request = ApiRequest::get("/plans", RESOURCE).params(params);
    run(client, request, Shape::Collection(page), || {
        "Failed to list plans".into()
    })
    .await
}

pub async fn get(
    client: &LatitudeClient,
    args: GetPlanArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::get(format!("/plans/{}", args.plan_id), RESOURCE);
    run(client, request, Shape::Single, || {
        format!("Failed to fetch plan {}", args.plan_id)
    })
    .await
}

pub async fn list_operating_systems(
    client: &LatitudeClient,
    args: ListOperatingSystemsArgs,
) -> Result<ResultEnvelope, OperationError> {
    let mut params = ApiParams::new();
    let page = params.paginate(&args.page);
    let request = ApiRequest::get("/plans/operating_systems", "Operating system").params(params);
    run(client, request, Shape::Collection(page), || {
        "Failed to list operating systems".into()
    })
    .await
}
