//! Server operations: `/servers` and its per-server sub-resources (deploy
//! config, lock, power actions, rescue mode, reinstall, IPMI, out-of-band).

use serde::Deserialize;
use serde_json::Value;

use super::{deleted, run, Shape};
use crate::client::{ApiRequest, LatitudeClient};
use crate::error::OperationError;
use crate::normalize::ResultEnvelope;
use crate::params::{
    resource_document, ApiParams, Attributes, HardwareRanges, Page, PageArgs, Tags,
};

const RESOURCE: &str = "Server";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListServersArgs {
    #[serde(flatten)]
    pub page: PageArgs,
    #[serde(flatten)]
    pub ranges: HardwareRanges,
    pub filter_project: Option<String>,
    pub filter_region: Option<String>,
    pub filter_hostname: Option<String>,
    pub filter_status: Option<String>,
    pub filter_plan: Option<String>,
    pub filter_created_at_gte: Option<String>,
    pub filter_created_at_lte: Option<String>,
    pub filter_label: Option<String>,
    pub filter_gpu: Option<bool>,
    pub filter_tags: Option<Tags>,
    pub extra_fields: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerIdArgs {
    pub server_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetServerArgs {
    pub server_id: String,
    pub extra_fields: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServerArgs {
    pub project: String,
    pub plan: String,
    pub site: String,
    pub operating_system: String,
    pub hostname: String,
    pub billing: Option<String>,
    pub ssh_keys: Option<Vec<String>>,
    pub user_data: Option<String>,
    pub raid: Option<String>,
    pub ipxe: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServerArgs {
    #[serde(rename = "serverId")]
    pub server_id: String,
    pub hostname: Option<String>,
    pub billing: Option<String>,
    pub project: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteServerArgs {
    #[serde(rename = "serverId")]
    pub server_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeployConfigArgs {
    #[serde(rename = "serverId")]
    pub server_id: String,
    pub hostname: Option<String>,
    pub operating_system: Option<String>,
    pub raid: Option<String>,
    pub user_data: Option<String>,
    pub ssh_keys: Option<Vec<String>>,
    pub ipxe_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServerActionArgs {
    #[serde(rename = "serverId")]
    pub server_id: String,
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct ReinstallArgs {
    #[serde(rename = "serverId")]
    pub server_id: String,
    pub operating_system: Option<String>,
    pub hostname: Option<String>,
    pub ssh_keys: Option<Vec<String>>,
    pub user_data: Option<String>,
    pub raid: Option<String>,
    pub ipxe: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOobArgs {
    #[serde(rename = "serverId")]
    pub server_id: String,
    pub ssh_key_id: Option<String>,
}

pub fn list_params(args: &ListServersArgs) -> (ApiParams, Page) {
    let mut params = ApiParams::new();
    let page = params.paginate(&args.page);
    params.filter("project", args.filter_project.as_deref());
    params.filter("region", args.filter_region.as_deref());
    params.filter("hostname", args.filter_hostname.as_deref());
    params.filter("status", args.filter_status.as_deref());
    params.filter("plan", args.filter_plan.as_deref());
    params.filter("created_at_gte", args.filter_created_at_gte.as_deref());
    params.filter("created_at_lte", args.filter_created_at_lte.as_deref());
    params.filter("label", args.filter_label.as_deref());
    params.filter("gpu", args.filter_gpu);
    args.ranges.apply(&mut params);
    params.tags_filter(args.filter_tags.as_ref());
    params.extra_fields("servers", args.extra_fields.as_deref());
    (params, page)
}

pub fn create_document(args: &CreateServerArgs) -> Value {
    let attributes = Attributes::new()
        .set("project", &args.project)
        .set("plan", &args.plan)
        .set("site", &args.site)
        .set("operating_system", &args.operating_system)
        .set("hostname", &args.hostname)
        .set_opt("billing", args.billing.as_ref())
        .set_opt("ssh_keys", args.ssh_keys.as_ref())
        .set_opt("user_data", args.user_data.as_ref())
        .set_opt("raid", args.raid.as_ref())
        .set_opt("ipxe", args.ipxe.as_ref());
    resource_document("servers", None, attributes)
}

pub fn update_document(args: &UpdateServerArgs) -> Value {
    let attributes = Attributes::new()
        .set_opt("hostname", args.hostname.as_ref())
        .set_opt("billing", args.billing.as_ref())
        .set_opt("project", args.project.as_ref())
        .set_opt("tags", args.tags.as_ref());
    resource_document("servers", Some(&args.server_id), attributes)
}

pub fn deploy_config_document(args: &DeployConfigArgs) -> Value {
    let attributes = Attributes::new()
        .set_opt("hostname", args.hostname.as_ref())
        .set_opt("operating_system", args.operating_system.as_ref())
        .set_opt("raid", args.raid.as_ref())
        .set_opt("user_data", args.user_data.as_ref())
        .set_opt("ssh_keys", args.ssh_keys.as_ref())
        .set_opt("ipxe_url", args.ipxe_url.as_ref());
    resource_document("deploy_config", Some(&args.server_id), attributes)
}

pub fn action_document(args: &ServerActionArgs) -> Value {
    resource_document(
        "actions",
        None,
        Attributes::new().set("action", &args.action),
    )
}

pub fn reinstall_document(args: &ReinstallArgs) -> Value {
    let attributes = Attributes::new()
        .set_opt("operating_system", args.operating_system.as_ref())
        .set_opt("hostname", args.hostname.as_ref())
        .set_opt("ssh_keys", args.ssh_keys.as_ref())
        .set_opt("user_data", args.user_data.as_ref())
        .set_opt("raid", args.raid.as_ref())
        .set_opt("ipxe", args.ipxe.as_ref());
    resource_document("reinstalls", None, attributes)
}

pub fn oob_document(args: &CreateOobArgs) -> Value {
    resource_document(
        "out_of_band",
        None,
        Attributes::new().set_opt("ssh_key_id", args.ssh_key_id.as_ref()),
    )
}

fn server_path(id: &str, suffix: &str) -> String {
    format!("/servers/{id}{suffix}")
}

pub async fn list(
    client: &LatitudeClient,
    args: ListServersArgs,
) -> Result<ResultEnvelope, OperationError> {
    let (params, page) = list_params(&args);
    let request = ApiRequest::get("/servers", RESOURCE).params(params);
    run(client, request, Shape::Collection(page), || {
        "Failed to list servers".into()
    })
    .await
}

pub async fn get(
    client: &LatitudeClient,
    args: GetServerArgs,
) -> Result<ResultEnvelope, OperationError> {
    let mut params = ApiParams::new();
    params.extra_fields("servers", args.extra_fields.as_deref());
    let request = ApiRequest::get(server_path(&args.server_id, ""), RESOURCE).params(params);
    run(client, request, Shape::Single, || {
        format!("Failed to fetch server {}", args.server_id)
    })
    .await
}

pub async fn create(
    client: &LatitudeClient,
    args: CreateServerArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post("/servers", RESOURCE).body(create_document(&args));
    run(client, request, Shape::Single, || {
        format!("Failed to create server '{}'", args.hostname)
    })
    .await
}

pub async fn update(
    client: &LatitudeClient,
    args: UpdateServerArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::patch(server_path(&args.server_id, ""), RESOURCE)
        .body(update_document(&args));
    run(client, request, Shape::Single, || {
        format!("Failed to update server {}", args.server_id)
    })
    .await
}

pub async fn delete(
    client: &LatitudeClient,
    args: DeleteServerArgs,
) -> Result<ResultEnvelope, OperationError> {
    let mut params = ApiParams::new();
    params.push_opt("reason", args.reason.as_deref());
    let request = ApiRequest::delete(server_path(&args.server_id, ""), RESOURCE).params(params);
    let envelope = run(client, request, Shape::Optional, || {
        format!("Failed to delete server {}", args.server_id)
    })
    .await?;
    Ok(deleted(envelope, &args.server_id))
}

pub async fn get_deploy_config(
    client: &LatitudeClient,
    args: ServerIdArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::get(server_path(&args.server_id, "/deploy_config"), RESOURCE);
    run(client, request, Shape::Single, || {
        format!("Failed to fetch deploy config for server {}", args.server_id)
    })
    .await
}

pub async fn update_deploy_config(
    client: &LatitudeClient,
    args: DeployConfigArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::patch(server_path(&args.server_id, "/deploy_config"), RESOURCE)
        .body(deploy_config_document(&args));
    run(client, request, Shape::Single, || {
        format!("Failed to update deploy config for server {}", args.server_id)
    })
    .await
}

pub async fn lock(
    client: &LatitudeClient,
    args: ServerIdArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post(server_path(&args.server_id, "/lock"), RESOURCE);
    run(client, request, Shape::Optional, || {
        format!("Failed to lock server {}", args.server_id)
    })
    .await
}

pub async fn unlock(
    client: &LatitudeClient,
    args: ServerIdArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post(server_path(&args.server_id, "/unlock"), RESOURCE);
    run(client, request, Shape::Optional, || {
        format!("Failed to unlock server {}", args.server_id)
    })
    .await
}

pub async fn run_action(
    client: &LatitudeClient,
    args: ServerActionArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post(server_path(&args.server_id, "/actions"), RESOURCE)
        .body(action_document(&args));
    run(client, request, Shape::Optional, || {
        format!("Failed to run {} on server {}", args.action, args.server_id)
    })
    .await
}

pub async fn enter_rescue_mode(
    client: &LatitudeClient,
    args: ServerIdArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post(server_path(&args.server_id, "/rescue_mode"), RESOURCE);
    run(client, request, Shape::Optional, || {
        format!("Failed to put server {} into rescue mode", args.server_id)
    })
    .await
}

pub async fn exit_rescue_mode(
    client: &LatitudeClient,
    args: ServerIdArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post(server_path(&args.server_id, "/exit_rescue_mode"), RESOURCE);
    run(client, request, Shape::Optional, || {
        format!("Failed to take server {} out of rescue mode", args.server_id)
    })
    .await
}

pub async fn reinstall(
    client: &LatitudeClient,
    args: ReinstallArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post(server_path(&args.server_id, "/reinstall"), RESOURCE)
        .body(reinstall_document(&args));
    run(client, request, Shape::Optional, || {
        format!("Failed to reinstall server {}", args.server_id)
    })
    .await
}

pub async fn generate_ipmi_credentials(
    client: &LatitudeClient,
    args: ServerIdArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post(server_path(&args.server_id, "/remote_access"), RESOURCE);
    run(client, request, Shape::Single, || {
        format!("Failed to generate IPMI credentials for server {}", args.server_id)
    })
    .await
}

pub async fn list_oob_connections(
    client: &LatitudeClient,
    args: ServerIdArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::get(
        server_path(&args.server_id, "/out_of_band_connection"),
        RESOURCE,
    );
    run(client, request, Shape::Single, || {
        format!("Failed to list out-of-band connections for server {}", args.server_id)
    })
    .await
}

pub async fn create_oob_connection(
    client: &LatitudeClient,
    args: CreateOobArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post(
        server_path(&args.server_id, "/out_of_band_connection"),
        RESOURCE,
    )
    .body(oob_document(&args));
    run(client, request, Shape::Single, || {
        format!("Failed to create out-of-band connection for server {}", args.server_id)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::schema::{find_tool, validate};
    use crate::test_support::StubServer;
    use pretty_assertions::assert_eq;
    use serde::de::DeserializeOwned;
    use serde_json::json;

    fn typed<T: DeserializeOwned>(tool: &str, args: Value) -> T {
        validate(find_tool(tool).unwrap(), &args)
            .unwrap()
            .into_typed()
            .unwrap()
    }

    #[test]
    fn ram_lower_bound_alone() {
        let args: ListServersArgs = typed("list_servers", json!({ "filterRamGte": 16 }));
        let (params, _) = list_params(&args);
        assert_eq!(params.get("filter[ram][gte]"), Some("16"));
        assert!(!params.contains_key("filter[ram][lte]"));
        assert!(!params.contains_key("filter[ram][eql]"));
    }

    #[test]
    fn all_range_bounds_travel_together() {
        let args: ListServersArgs = typed(
            "list_servers",
            json!({
                "filterRamEql": 32, "filterRamGte": 16, "filterRamLte": 64,
                "filterDiskGte": 500
            }),
        );
        let (params, _) = list_params(&args);
        assert_eq!(params.get("filter[ram][eql]"), Some("32"));
        assert_eq!(params.get("filter[ram][gte]"), Some("16"));
        assert_eq!(params.get("filter[ram][lte]"), Some("64"));
        assert_eq!(params.get("filter[disk][gte]"), Some("500"));
    }

    #[test]
    fn gpu_filter_is_tri_state() {
        let absent: ListServersArgs = typed("list_servers", json!({}));
        assert!(!list_params(&absent).0.contains_key("filter[gpu]"));

        let off: ListServersArgs = typed("list_servers", json!({ "filterGpu": false }));
        assert_eq!(list_params(&off).0.get("filter[gpu]"), Some("false"));

        let on: ListServersArgs = typed("list_servers", json!({ "filterGpu": true }));
        assert_eq!(list_params(&on).0.get("filter[gpu]"), Some("true"));
    }

    #[test]
    fn default_list_sends_only_pagination() {
        let args: ListServersArgs = typed("list_servers", json!({}));
        let (params, page) = list_params(&args);
        assert_eq!(page, Page { size: 20, number: 1 });
        assert_eq!(
            params.pairs(),
            &[
                ("page[size]".to_string(), "20".to_string()),
                ("page[number]".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn deploy_config_patch_omits_unset_fields() {
        let args: DeployConfigArgs = typed(
            "update_server_deploy_config",
            json!({ "serverId": "sv_1", "hostname": "web-1", "ssh_keys": ["ssh_1"] }),
        );
        assert_eq!(
            deploy_config_document(&args),
            json!({
                "data": {
                    "type": "deploy_config",
                    "id": "sv_1",
                    "attributes": { "hostname": "web-1", "ssh_keys": ["ssh_1"] }
                }
            })
        );
    }

    #[test]
    fn create_server_document() {
        let args: CreateServerArgs = typed(
            "create_server",
            json!({
                "project": "proj_1", "plan": "c2-small-x86", "site": "SAO",
                "operating_system": "ubuntu_22_04_x64_lts", "hostname": "web-1",
                "billing": "hourly"
            }),
        );
        assert_eq!(
            create_document(&args)["data"]["attributes"],
            json!({
                "project": "proj_1", "plan": "c2-small-x86", "site": "SAO",
                "operating_system": "ubuntu_22_04_x64_lts", "hostname": "web-1",
                "billing": "hourly"
            })
        );
    }

    #[tokio::test]
    async fn power_action_posts_action_document() {
        let stub = StubServer::reply(204, "").await;
        let client = LatitudeClient::new(&Config::for_test(&stub.url(), "k3y_value", 2_000)).unwrap();
        let args: ServerActionArgs =
            typed("run_server_action", json!({ "serverId": "sv_1", "action": "reboot" }));

        let env = run_action(&client, args).await.unwrap();
        assert_eq!(env, ResultEnvelope::empty());

        let req = stub.request().await;
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/servers/sv_1/actions");
        assert_eq!(
            serde_json::from_str::<Value>(&req.body).unwrap(),
            json!({ "data": { "type": "actions", "attributes": { "action": "reboot" } } })
        );
    }

    #[tokio::test]
    async fn list_sends_range_filters_on_the_wire() {
        let stub = StubServer::reply(
            200,
            r#"{"data":[{"id":"sv_1","type":"servers","attributes":{"hostname":"web-1"}}],"meta":{}}"#,
        )
        .await;
        let client = LatitudeClient::new(&Config::for_test(&stub.url(), "k3y_value", 2_000)).unwrap();
        let args: ListServersArgs = typed("list_servers", json!({ "filterRamGte": 16 }));

        let env = list(&client, args).await.unwrap();
        assert_eq!(env.meta, json!({ "total": 1, "page": 1, "limit": 20 }));

        let query = stub.request().await.query();
        assert!(query.contains(&("filter[ram][gte]".to_string(), "16".to_string())));
        assert!(!query.iter().any(|(k, _)| k == "filter[ram][lte]"));
    }

    #[tokio::test]
    async fn lock_failure_carries_context() {
        let stub = StubServer::reply(403, r#"{"errors":[{"title":"Forbidden"}]}"#).await;
        let client = LatitudeClient::new(&Config::for_test(&stub.url(), "k3y_value", 2_000)).unwrap();
        let err = lock(&client, ServerIdArgs { server_id: "sv_9".into() })
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to lock server sv_9: Forbidden"));
    }
}
