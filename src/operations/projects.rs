//! Project operations: `/projects`.

use serde::Deserialize;
use serde_json::Value;

use super::{deleted, run, Shape};
use crate::client::{ApiRequest, LatitudeClient};
use crate::error::OperationError;
use crate::normalize::ResultEnvelope;
use crate::params::{resource_document, ApiParams, Attributes, Page, PageArgs, Tags};

const RESOURCE: &str = "Project";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsArgs {
    #[serde(flatten)]
    pub page: PageArgs,
    pub filter_name: Option<String>,
    pub filter_slug: Option<String>,
    pub filter_description: Option<String>,
    pub filter_billing_type: Option<String>,
    pub filter_environment: Option<String>,
    pub filter_tags: Option<Tags>,
    pub extra_fields: Option<String>,
}

/// Older search interface: bare `query`/`environment`/`tags` plus either
/// pagination dialect.
#[derive(Debug, Deserialize)]
pub struct SearchProjectsArgs {
    #[serde(flatten)]
    pub page: PageArgs,
    pub query: Option<String>,
    pub environment: Option<String>,
    pub tags: Option<Tags>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetProjectArgs {
    pub id: String,
    pub extra_fields: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectArgs {
    pub name: String,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub provisioning_type: Option<String>,
    pub billing_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectArgs {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectIdArgs {
    pub id: String,
}

pub fn list_params(args: &ListProjectsArgs) -> (ApiParams, Page) {
    let mut params = ApiParams::new();
    let page = params.paginate(&args.page);
    params.filter("name", args.filter_name.as_deref());
    params.filter("slug", args.filter_slug.as_deref());
    params.filter("description", args.filter_description.as_deref());
    params.filter("billing_type", args.filter_billing_type.as_deref());
    params.filter("environment", args.filter_environment.as_deref());
    params.tags_filter(args.filter_tags.as_ref());
    params.extra_fields("projects", args.extra_fields.as_deref());
    (params, page)
}

pub fn search_params(args: &SearchProjectsArgs) -> (ApiParams, Page) {
    let mut params = ApiParams::new();
    let page = params.paginate(&args.page);
    params.filter("name", args.query.as_deref());
    params.filter("environment", args.environment.as_deref());
    params.tags_filter(args.tags.as_ref());
    (params, page)
}

pub fn create_document(args: &CreateProjectArgs) -> Value {
    let attributes = Attributes::new()
        .set("name", &args.name)
        .set(
            "provisioning_type",
            args.provisioning_type.as_deref().unwrap_or("on_demand"),
        )
        .set_opt("description", args.description.as_ref())
        .set_opt("environment", args.environment.as_ref())
        .set_opt("billing_type", args.billing_type.as_ref());
    resource_document("projects", None, attributes)
}

pub fn update_document(args: &UpdateProjectArgs) -> Value {
    let attributes = Attributes::new()
        .set_opt("name", args.name.as_ref())
        .set_opt("description", args.description.as_ref())
        .set_opt("environment", args.environment.as_ref())
        .set_opt("tags", args.tags.as_ref());
    resource_document("projects", Some(&args.id), attributes)
}

pub async fn list(
    client: &LatitudeClient,
    args: ListProjectsArgs,
) -> Result<ResultEnvelope, OperationError> {
    let (params, page) = list_params(&args);
    let request = ApiRequest::get("/projects", RESOURCE).params(params);
    run(client, request, Shape::Collection(page), || {
        "Failed to list projects".into()
    })
    .await
}

pub async fn search(
    client: &LatitudeClient,
    args: SearchProjectsArgs,
) -> Result<ResultEnvelope, OperationError> {
    let (params, page) = search_params(&args);
    let request = ApiRequest::get("/projects", RESOURCE).params(params);
    run(client, request, Shape::Collection(page), || {
        "Failed to search projects".into()
    })
    .await
}

pub async fn get(
    client: &LatitudeClient,
    args: GetProjectArgs,
) -> Result<ResultEnvelope, OperationError> {
    let mut params = ApiParams::new();
    params.extra_fields("projects", args.extra_fields.as_deref());
    let request = ApiRequest::get(format!("/projects/{}", args.id), RESOURCE).params(params);
    run(client, request, Shape::Single, || {
        format!("Failed to fetch project {}", args.id)
    })
    .await
}

pub async fn create(
    client: &LatitudeClient,
    args: CreateProjectArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::post("/projects", RESOURCE).body(create_document(&args));
    run(client, request, Shape::Single, || {
        format!("Failed to create project '{}'", args.name)
    })
    .await
}

pub async fn update(
    client: &LatitudeClient,
    args: UpdateProjectArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request =
        ApiRequest::patch(format!("/projects/{}", args.id), RESOURCE).body(update_document(&args));
    run(client, request, Shape::Single, || {
        format!("Failed to update project {}", args.id)
    })
    .await
}

pub async fn delete(
    client: &LatitudeClient,
    args: ProjectIdArgs,
) -> Result<ResultEnvelope, OperationError> {
    let request = ApiRequest::delete(format!("/projects/{}", args.id), RESOURCE);
    let envelope = run(client, request, Shape::Optional, || {
        format!("Failed to delete project {}", args.id)
    })
    .await?;
    Ok(deleted(envelope, &args.id))
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
    fn create_with_only_a_name() {
        let args: CreateProjectArgs = typed("create_project", json!({ "name": "demo" }));
        let doc = create_document(&args);
        assert_eq!(
            doc,
            json!({
                "data": {
                    "type": "projects",
                    "attributes": { "name": "demo", "provisioning_type": "on_demand" }
                }
            })
        );
    }

    #[test]
    fn create_keeps_explicit_provisioning_type() {
        let args: CreateProjectArgs = typed(
            "create_project",
            json!({ "name": "demo", "provisioning_type": "reserved", "environment": "Staging" }),
        );
        let attrs = &create_document(&args)["data"]["attributes"];
        assert_eq!(attrs["provisioning_type"], json!("reserved"));
        assert_eq!(attrs["environment"], json!("Staging"));
        assert!(attrs.get("description").is_none());
    }

    #[test]
    fn update_sends_only_supplied_fields() {
        let args: UpdateProjectArgs =
            typed("update_project", json!({ "id": "proj_1", "description": "" }));
        assert_eq!(
            update_document(&args),
            json!({
                "data": { "type": "projects", "id": "proj_1", "attributes": { "description": "" } }
            })
        );
    }

    #[test]
    fn list_maps_filters_and_extra_fields() {
        let args: ListProjectsArgs = typed(
            "list_projects",
            json!({
                "pageSize": 5,
                "filterEnvironment": "Production",
                "filterTags": ["tag_a", "tag_b"],
                "extraFields": "last_renewal_date,next_renewal_date"
            }),
        );
        let (params, page) = list_params(&args);
        assert_eq!(page, Page { size: 5, number: 1 });
        assert_eq!(params.get("filter[environment]"), Some("Production"));
        assert_eq!(params.get("filter[tags]"), Some("tag_a,tag_b"));
        assert_eq!(
            params.get("extra_fields[projects]"),
            Some("last_renewal_date,next_renewal_date")
        );
        assert!(!params.contains_key("filter[name]"));
    }

    #[test]
    fn search_accepts_legacy_dialect() {
        let args: SearchProjectsArgs = typed(
            "search_projects",
            json!({ "query": "web", "tags": ["t1", "t2"], "limit": 5, "page": 2 }),
        );
        let (params, page) = search_params(&args);
        assert_eq!(page, Page { size: 5, number: 2 });
        assert_eq!(
            params.pairs(),
            &[
                ("page[size]".to_string(), "5".to_string()),
                ("page[number]".to_string(), "2".to_string()),
                ("filter[name]".to_string(), "web".to_string()),
                ("filter[tags]".to_string(), "t1,t2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn get_missing_project_reports_not_found() {
        let stub = StubServer::reply(404, r#"{"errors":[{"status":"404","title":"Not Found"}]}"#).await;
        let client = LatitudeClient::new(&Config::for_test(&stub.url(), "k3y_value", 2_000)).unwrap();
        let args: GetProjectArgs = typed("get_project", json!({ "id": "proj_doesnotexist" }));

        let err = get(&client, args).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch project proj_doesnotexist: Project not found"
        );
        assert_eq!(stub.request().await.path, "/projects/proj_doesnotexist");
    }

    #[tokio::test]
    async fn delete_with_empty_body_reports_what_was_deleted() {
        let stub = StubServer::reply(204, "").await;
        let client = LatitudeClient::new(&Config::for_test(&stub.url(), "k3y_value", 2_000)).unwrap();
        let env = delete(&client, ProjectIdArgs { id: "proj_1".into() }).await.unwrap();
        assert_eq!(env.meta, json!({ "deleted": "proj_1" }));
        assert_eq!(stub.request().await.method, "DELETE");
    }
}
