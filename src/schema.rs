//! Declarative argument schemas and the generic validator that interprets them.
//!
//! Every tool is a [`ToolSpec`]: a name, a description, and groups of
//! [`ArgSpec`] rows. [`validate`] walks the rows once, collects *every*
//! violation (not just the first), applies declared defaults, and drops
//! nothing silently: unknown arguments are violations too. The same table
//! renders the JSON Schema advertised in `tools/list`.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Primitive shape of one argument.
#[derive(Debug, Clone, Copy)]
pub enum ArgKind {
    /// UTF-8 string with a character-count window.
    Str { min: usize, max: Option<usize> },
    /// Provider resource identifier, safe to splice into a URL path.
    Id,
    /// Whole number within bounds.
    Int { min: i64, max: Option<i64> },
    Bool,
    /// One of a fixed set of strings.
    Enum(&'static [&'static str]),
    /// Array of non-empty strings.
    StrList,
    /// Comma-separated string, or an array of strings (older callers).
    Tags,
}

/// Compile-time default for an optional argument.
#[derive(Debug, Clone, Copy)]
pub enum DefaultValue {
    Int(i64),
}

impl DefaultValue {
    fn to_value(self) -> Value {
        match self {
            DefaultValue::Int(n) => json!(n),
        }
    }
}

/// One row of a tool's argument table.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
    /// Skip the default when this other argument was supplied (new-dialect
    /// pagination yields to a legacy alias the caller actually sent).
    pub unless_present: Option<&'static str>,
    pub description: &'static str,
}

const fn arg(name: &'static str, kind: ArgKind, description: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        kind,
        required: false,
        default: None,
        unless_present: None,
        description,
    }
}

impl ArgSpec {
    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    const fn unless_present(mut self, other: &'static str) -> Self {
        self.unless_present = Some(other);
        self
    }
}

/// A tool: name, description and argument rows (grouped so shared blocks
/// like pagination are declared once).
#[derive(Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub args: &'static [&'static [ArgSpec]],
}

impl ToolSpec {
    pub fn arg_specs(&self) -> impl Iterator<Item = &'static ArgSpec> {
        self.args.iter().flat_map(|group| group.iter())
    }
}

pub const ENVIRONMENTS: &[&str] = &["Development", "Production", "Staging"];
pub const BILLING: &[&str] = &["hourly", "monthly", "yearly"];
pub const PROVISIONING: &[&str] = &["on_demand", "reserved"];
pub const POWER_ACTIONS: &[&str] = &["power_on", "power_off", "reboot"];
pub const RAID_LEVELS: &[&str] = &["raid-0", "raid-1"];

const NAME: ArgKind = ArgKind::Str { min: 1, max: Some(100) };
const DESCRIPTION: ArgKind = ArgKind::Str { min: 0, max: Some(500) };
const TEXT: ArgKind = ArgKind::Str { min: 1, max: Some(255) };
const POSITIVE: ArgKind = ArgKind::Int { min: 1, max: None };

const PAGINATION: &[ArgSpec] = &[
    arg("pageSize", POSITIVE, "Results per page (default 20).")
        .default(DefaultValue::Int(20))
        .unless_present("limit"),
    arg("pageNumber", POSITIVE, "Page number, starting at 1 (default 1).")
        .default(DefaultValue::Int(1))
        .unless_present("page"),
    arg("limit", POSITIVE, "Deprecated alias for pageSize; pageSize wins when both are set."),
    arg("page", POSITIVE, "Deprecated alias for pageNumber; pageNumber wins when both are set."),
];

const RANGE_FILTERS: &[ArgSpec] = &[
    arg("filterRamEql", POSITIVE, "RAM exactly this many GB."),
    arg("filterRamGte", POSITIVE, "RAM at least this many GB."),
    arg("filterRamLte", POSITIVE, "RAM at most this many GB."),
    arg("filterDiskEql", POSITIVE, "Disk exactly this many GB."),
    arg("filterDiskGte", POSITIVE, "Disk at least this many GB."),
    arg("filterDiskLte", POSITIVE, "Disk at most this many GB."),
];

const PROJECT_ID: &[ArgSpec] = &[arg("id", ArgKind::Id, "Project ID (e.g. proj_abc123).").required()];
const SERVER_ID: &[ArgSpec] = &[arg("serverId", ArgKind::Id, "Server ID (e.g. sv_abc123).").required()];

const PROJECT_FILTERS: &[ArgSpec] = &[
    arg("filterName", TEXT, "Filter by project name."),
    arg("filterSlug", TEXT, "Filter by project slug."),
    arg("filterDescription", TEXT, "Filter by description."),
    arg("filterBillingType", ArgKind::Enum(BILLING), "Filter by billing type."),
    arg("filterEnvironment", ArgKind::Enum(ENVIRONMENTS), "Filter by environment."),
    arg("filterTags", ArgKind::Tags, "Comma-separated tag IDs."),
    arg("extraFields", TEXT, "Lazy attributes to include, e.g. 'last_renewal_date,next_renewal_date'."),
];

const SEARCH_PROJECTS: &[ArgSpec] = &[
    arg("query", TEXT, "Text matched against project names."),
    arg("environment", ArgKind::Enum(ENVIRONMENTS), "Only projects in this environment."),
    arg("tags", ArgKind::Tags, "Tag IDs, as an array or a comma-separated string."),
];

const GET_PROJECT: &[ArgSpec] = &[arg("extraFields", TEXT, "Lazy attributes to include.")];

const CREATE_PROJECT: &[ArgSpec] = &[
    arg("name", NAME, "Project name (1-100 characters).").required(),
    arg("description", DESCRIPTION, "Project description (max 500 characters)."),
    arg("environment", ArgKind::Enum(ENVIRONMENTS), "Project environment."),
    arg("provisioning_type", ArgKind::Enum(PROVISIONING), "Provisioning type (default on_demand)."),
    arg("billing_type", ArgKind::Enum(BILLING), "Billing cycle."),
];

const UPDATE_PROJECT: &[ArgSpec] = &[
    arg("name", NAME, "New project name."),
    arg("description", DESCRIPTION, "New description."),
    arg("environment", ArgKind::Enum(ENVIRONMENTS), "New environment."),
    arg("tags", ArgKind::StrList, "Tag IDs to assign (replaces existing tags)."),
];

const SERVER_FILTERS: &[ArgSpec] = &[
    arg("filterProject", TEXT, "Project ID or slug."),
    arg("filterRegion", TEXT, "Region slug."),
    arg("filterHostname", TEXT, "Hostname."),
    arg("filterStatus", TEXT, "Server status, e.g. 'on' or 'off'."),
    arg("filterPlan", TEXT, "Plan slug."),
    arg("filterCreatedAtGte", TEXT, "Created at or after this ISO-8601 timestamp."),
    arg("filterCreatedAtLte", TEXT, "Created at or before this ISO-8601 timestamp."),
    arg("filterLabel", TEXT, "Label."),
    arg("filterGpu", ArgKind::Bool, "Only servers with (true) or without (false) a GPU."),
    arg("filterTags", ArgKind::Tags, "Comma-separated tag IDs."),
    arg("extraFields", TEXT, "Lazy attributes to include, e.g. 'credentials'."),
];

const GET_SERVER: &[ArgSpec] = &[arg("extraFields", TEXT, "Lazy attributes to include, e.g. 'credentials'.")];

const CREATE_SERVER: &[ArgSpec] = &[
    arg("project", TEXT, "Project ID or slug.").required(),
    arg("plan", TEXT, "Plan slug, e.g. 'c2-small-x86'.").required(),
    arg("site", TEXT, "Region slug, e.g. 'SAO'.").required(),
    arg("operating_system", TEXT, "Operating system slug, e.g. 'ubuntu_22_04_x64_lts'.").required(),
    arg("hostname", TEXT, "Server hostname.").required(),
    arg("billing", ArgKind::Enum(BILLING), "Billing cycle."),
    arg("ssh_keys", ArgKind::StrList, "SSH key IDs to install."),
    arg("user_data", ArgKind::Id, "User data ID."),
    arg("raid", ArgKind::Enum(RAID_LEVELS), "RAID layout."),
    arg("ipxe", TEXT, "iPXE script URL (for the iPXE operating system)."),
];

const UPDATE_SERVER: &[ArgSpec] = &[
    arg("hostname", TEXT, "New hostname."),
    arg("billing", ArgKind::Enum(BILLING), "New billing cycle."),
    arg("project", TEXT, "Move the server to this project."),
    arg("tags", ArgKind::StrList, "Tag IDs to assign."),
];

const DELETE_SERVER: &[ArgSpec] = &[arg("reason", DESCRIPTION, "Why the server is being removed.")];

const DEPLOY_CONFIG: &[ArgSpec] = &[
    arg("hostname", TEXT, "Hostname for the next deploy."),
    arg("operating_system", TEXT, "Operating system slug."),
    arg("raid", ArgKind::Enum(RAID_LEVELS), "RAID layout."),
    arg("user_data", ArgKind::Id, "User data ID."),
    arg("ssh_keys", ArgKind::StrList, "SSH key IDs."),
    arg("ipxe_url", TEXT, "iPXE script URL."),
];

const SERVER_ACTION: &[ArgSpec] = &[arg("action", ArgKind::Enum(POWER_ACTIONS), "Power action.").required()];

const REINSTALL: &[ArgSpec] = &[
    arg("operating_system", TEXT, "Operating system slug."),
    arg("hostname", TEXT, "Hostname."),
    arg("ssh_keys", ArgKind::StrList, "SSH key IDs."),
    arg("user_data", ArgKind::Id, "User data ID."),
    arg("raid", ArgKind::Enum(RAID_LEVELS), "RAID layout."),
    arg("ipxe", TEXT, "iPXE script URL."),
];

const CREATE_OOB: &[ArgSpec] = &[arg("ssh_key_id", ArgKind::Id, "SSH key ID allowed to use the connection.")];

const PLAN_FILTERS: &[ArgSpec] = &[
    arg("filterName", TEXT, "Plan name."),
    arg("filterSlug", TEXT, "Plan slug."),
    arg("filterLocation", TEXT, "Region slug where the plan is offered."),
    arg("filterStockLevel", TEXT, "Stock level, e.g. 'high', 'low', 'unavailable'."),
    arg("filterInStock", ArgKind::Bool, "Only plans in stock (true) or out of stock (false)."),
    arg("filterGpu", ArgKind::Bool, "Only plans with (true) or without (false) a GPU."),
];

const PLAN_ID: &[ArgSpec] = &[arg("planId", ArgKind::Id, "Plan ID.").required()];

const REGION_FILTERS: &[ArgSpec] = &[arg("filterCountry", TEXT, "Country name.")];

const REGION_ID: &[ArgSpec] = &[arg("regionId", ArgKind::Id, "Region ID.").required()];

/// Every tool this server exposes.
pub static TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "test_connection",
        description: "Check that the API key works and the Latitude.sh API is reachable. Uses a short 5s timeout.",
        args: &[],
    },
    ToolSpec {
        name: "list_projects",
        description: "List projects with optional filters and pagination.",
        args: &[PAGINATION, PROJECT_FILTERS],
    },
    ToolSpec {
        name: "search_projects",
        description: "Search projects by name, environment and tags. Older interface; prefer list_projects.",
        args: &[SEARCH_PROJECTS, PAGINATION],
    },
    ToolSpec {
        name: "get_project",
        description: "Get a single project by ID.",
        args: &[PROJECT_ID, GET_PROJECT],
    },
    ToolSpec {
        name: "create_project",
        description: "Create a project. Only the fields you pass are sent; provisioning_type defaults to on_demand.",
        args: &[CREATE_PROJECT],
    },
    ToolSpec {
        name: "update_project",
        description: "Update a project. Fields you omit are left unchanged.",
        args: &[PROJECT_ID, UPDATE_PROJECT],
    },
    ToolSpec {
        name: "delete_project",
        description: "Delete a project. The project must have no servers.",
        args: &[PROJECT_ID],
    },
    ToolSpec {
        name: "list_servers",
        description: "List servers with optional filters (project, region, RAM/disk ranges, GPU, tags) and pagination.",
        args: &[PAGINATION, SERVER_FILTERS, RANGE_FILTERS],
    },
    ToolSpec {
        name: "get_server",
        description: "Get a single server by ID.",
        args: &[SERVER_ID, GET_SERVER],
    },
    ToolSpec {
        name: "create_server",
        description: "Deploy a new server.",
        args: &[CREATE_SERVER],
    },
    ToolSpec {
        name: "update_server",
        description: "Update a server's hostname, billing, project or tags. Fields you omit are left unchanged.",
        args: &[SERVER_ID, UPDATE_SERVER],
    },
    ToolSpec {
        name: "delete_server",
        description: "Remove a server. This cannot be undone.",
        args: &[SERVER_ID, DELETE_SERVER],
    },
    ToolSpec {
        name: "get_server_deploy_config",
        description: "Get the deploy configuration used on the server's next reinstall.",
        args: &[SERVER_ID],
    },
    ToolSpec {
        name: "update_server_deploy_config",
        description: "Update the server's deploy configuration. Fields you omit are left unchanged.",
        args: &[SERVER_ID, DEPLOY_CONFIG],
    },
    ToolSpec {
        name: "lock_server",
        description: "Lock a server so it cannot be updated, reinstalled or deleted.",
        args: &[SERVER_ID],
    },
    ToolSpec {
        name: "unlock_server",
        description: "Unlock a previously locked server.",
        args: &[SERVER_ID],
    },
    ToolSpec {
        name: "run_server_action",
        description: "Power on, power off or reboot a server.",
        args: &[SERVER_ID, SERVER_ACTION],
    },
    ToolSpec {
        name: "enter_rescue_mode",
        description: "Boot the server into rescue mode.",
        args: &[SERVER_ID],
    },
    ToolSpec {
        name: "exit_rescue_mode",
        description: "Leave rescue mode and boot the installed system.",
        args: &[SERVER_ID],
    },
    ToolSpec {
        name: "reinstall_server",
        description: "Reinstall the server's operating system. Omitted fields use the current deploy config.",
        args: &[SERVER_ID, REINSTALL],
    },
    ToolSpec {
        name: "generate_ipmi_credentials",
        description: "Generate temporary IPMI credentials for the server.",
        args: &[SERVER_ID],
    },
    ToolSpec {
        name: "list_oob_connections",
        description: "List out-of-band connections for the server.",
        args: &[SERVER_ID],
    },
    ToolSpec {
        name: "create_oob_connection",
        description: "Open an out-of-band (serial-over-SSH) connection to the server.",
        args: &[SERVER_ID, CREATE_OOB],
    },
    ToolSpec {
        name: "list_plans",
        description: "List server plans with stock, GPU and RAM/disk range filters.",
        args: &[PAGINATION, PLAN_FILTERS, RANGE_FILTERS],
    },
    ToolSpec {
        name: "get_plan",
        description: "Get a single plan by ID.",
        args: &[PLAN_ID],
    },
    ToolSpec {
        name: "list_operating_systems",
        description: "List operating systems available for deploys.",
        args: &[PAGINATION],
    },
    ToolSpec {
        name: "list_regions",
        description: "List regions (sites) where servers can be deployed.",
        args: &[PAGINATION, REGION_FILTERS],
    },
    ToolSpec {
        name: "get_region",
        description: "Get a single region by ID.",
        args: &[REGION_ID],
    },
];

/// Look up a tool by name.
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// All constraints a call violated.
#[derive(Debug, Error)]
#[error("Invalid arguments for {tool}: {}", join(.violations))]
pub struct ValidationError {
    pub tool: String,
    pub violations: Vec<Violation>,
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Arguments that passed validation: declared keys only, defaults applied.
#[derive(Debug, Clone)]
pub struct Validated {
    tool: &'static str,
    args: Map<String, Value>,
}

impl Validated {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Deserialize into the typed record an operation consumes.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ValidationError> {
        serde_json::from_value(Value::Object(self.args)).map_err(|e| ValidationError {
            tool: self.tool.to_string(),
            violations: vec![Violation {
                path: String::new(),
                reason: e.to_string(),
            }],
        })
    }
}

/// Validate raw `arguments` against `spec`.
pub fn validate(spec: &ToolSpec, raw: &Value) -> Result<Validated, ValidationError> {
    let empty = Map::new();
    let input = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => {
            return Err(ValidationError {
                tool: spec.name.to_string(),
                violations: vec![Violation {
                    path: String::new(),
                    reason: "arguments must be an object".into(),
                }],
            })
        }
    };

    let mut violations = Vec::new();
    let mut args = Map::new();

    for key in input.keys() {
        if !spec.arg_specs().any(|a| a.name == key) {
            violations.push(Violation {
                path: key.clone(),
                reason: "unknown argument".into(),
            });
        }
    }

    for field in spec.arg_specs() {
        match input.get(field.name).filter(|v| !v.is_null()) {
            Some(value) => match check(field.name, field.kind, value) {
                Ok(normalized) => {
                    args.insert(field.name.to_string(), normalized);
                }
                Err(mut errs) => violations.append(&mut errs),
            },
            None if field.required => violations.push(Violation {
                path: field.name.to_string(),
                reason: "is required".into(),
            }),
            None => {
                let suppressed = field
                    .unless_present
                    .is_some_and(|other| input.get(other).is_some_and(|v| !v.is_null()));
                if let (Some(default), false) = (field.default, suppressed) {
                    args.insert(field.name.to_string(), default.to_value());
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(Validated {
            tool: spec.name,
            args,
        })
    } else {
        Err(ValidationError {
            tool: spec.name.to_string(),
            violations,
        })
    }
}

fn violation(path: &str, reason: impl Into<String>) -> Vec<Violation> {
    vec![Violation {
        path: path.to_string(),
        reason: reason.into(),
    }]
}

/// Check one present value; returns the value to keep.
fn check(path: &str, kind: ArgKind, value: &Value) -> Result<Value, Vec<Violation>> {
    match kind {
        ArgKind::Str { min, max } => {
            let s = value.as_str().ok_or_else(|| violation(path, "must be a string"))?;
            let len = s.chars().count();
            if len < min {
                return Err(violation(path, format!("must be at least {min} characters")));
            }
            if let Some(max) = max.filter(|max| len > *max) {
                return Err(violation(path, format!("must be at most {max} characters")));
            }
            Ok(value.clone())
        }
        ArgKind::Id => {
            let s = value.as_str().ok_or_else(|| violation(path, "must be a string"))?;
            let well_formed = !s.is_empty()
                && s.len() <= 64
                && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
            if well_formed {
                Ok(value.clone())
            } else {
                Err(violation(
                    path,
                    "must be 1-64 characters of letters, digits, '_' or '-'",
                ))
            }
        }
        ArgKind::Int { min, max } => {
            let n = as_integer(value).ok_or_else(|| violation(path, "must be an integer"))?;
            if n < min {
                return Err(violation(path, format!("must be >= {min}")));
            }
            if let Some(max) = max.filter(|max| n > *max) {
                return Err(violation(path, format!("must be <= {max}")));
            }
            Ok(json!(n))
        }
        ArgKind::Bool => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| violation(path, "must be a boolean")),
        ArgKind::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(value.clone()),
            _ => Err(violation(
                path,
                format!("must be one of: {}", allowed.join(", ")),
            )),
        },
        ArgKind::StrList => check_str_list(path, value),
        ArgKind::Tags => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Array(_) => check_str_list(path, value),
            _ => Err(violation(
                path,
                "must be a comma-separated string or an array of strings",
            )),
        },
    }
}

fn check_str_list(path: &str, value: &Value) -> Result<Value, Vec<Violation>> {
    let items = value
        .as_array()
        .ok_or_else(|| violation(path, "must be an array of strings"))?;
    let errs: Vec<Violation> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.as_str().map_or(true, str::is_empty))
        .map(|(i, _)| Violation {
            path: format!("{path}[{i}]"),
            reason: "must be a non-empty string".into(),
        })
        .collect();
    if errs.is_empty() {
        Ok(value.clone())
    } else {
        Err(errs)
    }
}

/// Integers, plus floats with no fractional part (some clients send 20.0).
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// JSON Schema for a tool's `inputSchema`.
pub fn input_schema(spec: &ToolSpec) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in spec.arg_specs() {
        let mut prop = match field.kind {
            ArgKind::Str { min, max } => {
                let mut p = json!({ "type": "string" });
                if min > 0 {
                    p["minLength"] = json!(min);
                }
                if let Some(max) = max {
                    p["maxLength"] = json!(max);
                }
                p
            }
            ArgKind::Id => json!({ "type": "string", "pattern": "^[A-Za-z0-9_-]{1,64}$" }),
            ArgKind::Int { min, max } => {
                let mut p = json!({ "type": "integer", "minimum": min });
                if let Some(max) = max {
                    p["maximum"] = json!(max);
                }
                p
            }
            ArgKind::Bool => json!({ "type": "boolean" }),
            ArgKind::Enum(values) => json!({ "type": "string", "enum": values }),
            ArgKind::StrList => json!({ "type": "array", "items": { "type": "string" } }),
            ArgKind::Tags => json!({
                "oneOf": [
                    { "type": "string" },
                    { "type": "array", "items": { "type": "string" } }
                ]
            }),
        };
        prop["description"] = json!(field.description);
        if let Some(default) = field.default {
            prop["default"] = default.to_value();
        }
        if field.required {
            required.push(field.name);
        }
        properties.insert(field.name.to_string(), prop);
    }

    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tool(name: &str) -> &'static ToolSpec {
        find_tool(name).expect("tool exists")
    }

    #[test]
    fn tool_names_are_unique() {
        let mut names: Vec<&str> = TOOLS.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TOOLS.len());
    }

    #[test]
    fn no_tool_declares_an_argument_twice() {
        for spec in TOOLS {
            let mut names: Vec<&str> = spec.arg_specs().map(|a| a.name).collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "{} has duplicate arguments", spec.name);
        }
    }

    #[test]
    fn pagination_defaults_are_applied() {
        let v = validate(tool("list_projects"), &json!({})).unwrap();
        assert_eq!(v.get("pageSize"), Some(&json!(20)));
        assert_eq!(v.get("pageNumber"), Some(&json!(1)));
        assert_eq!(v.get("limit"), None);
    }

    #[test]
    fn legacy_alias_suppresses_default() {
        let v = validate(tool("list_projects"), &json!({ "limit": 5, "page": 3 })).unwrap();
        assert_eq!(v.get("pageSize"), None);
        assert_eq!(v.get("pageNumber"), None);
        assert_eq!(v.get("limit"), Some(&json!(5)));
    }

    #[test]
    fn every_violation_is_reported() {
        let err = validate(
            tool("create_project"),
            &json!({
                "description": "x".repeat(501),
                "environment": "Testing",
                "colour": "blue"
            }),
        )
        .unwrap_err();
        assert_eq!(err.tool, "create_project");
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["colour", "name", "description", "environment"]);
        assert!(err.to_string().starts_with("Invalid arguments for create_project: "));
    }

    #[test]
    fn string_length_bounds() {
        let spec = tool("create_project");
        assert!(validate(spec, &json!({ "name": "" })).is_err());
        assert!(validate(spec, &json!({ "name": "a" })).is_ok());
        assert!(validate(spec, &json!({ "name": "a".repeat(100) })).is_ok());
        assert!(validate(spec, &json!({ "name": "a".repeat(101) })).is_err());
        assert!(validate(spec, &json!({ "name": "a", "description": "d".repeat(500) })).is_ok());
    }

    #[test]
    fn numeric_bounds_and_types() {
        let spec = tool("list_servers");
        let err = validate(spec, &json!({ "pageSize": 0, "filterRamGte": "16", "filterGpu": "yes" }))
            .unwrap_err();
        let reasons: Vec<String> = err.violations.iter().map(ToString::to_string).collect();
        assert_eq!(
            reasons,
            vec![
                "pageSize: must be >= 1",
                "filterGpu: must be a boolean",
                "filterRamGte: must be an integer",
            ]
        );
        let ok = validate(spec, &json!({ "pageSize": 50.0 })).unwrap();
        assert_eq!(ok.get("pageSize"), Some(&json!(50)));
    }

    #[test]
    fn explicit_false_is_kept_and_null_is_absent() {
        let spec = tool("list_servers");
        let v = validate(spec, &json!({ "filterGpu": false, "filterRegion": null })).unwrap();
        assert_eq!(v.get("filterGpu"), Some(&json!(false)));
        assert_eq!(v.get("filterRegion"), None);
    }

    #[test]
    fn ids_must_be_path_safe() {
        let spec = tool("get_project");
        assert!(validate(spec, &json!({ "id": "proj_AbC-123" })).is_ok());
        for bad in ["", "../users", "proj 1", "proj/1", "proj?x=1"] {
            assert!(validate(spec, &json!({ "id": bad })).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn tags_accept_string_or_array() {
        let spec = tool("search_projects");
        assert!(validate(spec, &json!({ "tags": "tag_a,tag_b" })).is_ok());
        assert!(validate(spec, &json!({ "tags": ["tag_a", "tag_b"] })).is_ok());
        let err = validate(spec, &json!({ "tags": ["tag_a", 3, ""] })).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["tags[1]", "tags[2]"]);
        assert!(validate(spec, &json!({ "tags": 7 })).is_err());
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = validate(tool("list_regions"), &json!([1, 2])).unwrap_err();
        assert_eq!(err.violations[0].reason, "arguments must be an object");
        assert!(validate(tool("list_regions"), &Value::Null).is_ok());
    }

    #[test]
    fn input_schema_mirrors_the_table() {
        let schema = input_schema(tool("run_server_action"));
        assert_eq!(schema["required"], json!(["serverId", "action"]));
        assert_eq!(
            schema["properties"]["action"]["enum"],
            json!(["power_on", "power_off", "reboot"])
        );
        assert_eq!(schema["additionalProperties"], json!(false));

        let schema = input_schema(tool("list_plans"));
        assert_eq!(schema["properties"]["pageSize"]["default"], json!(20));
        assert_eq!(schema["properties"]["filterRamGte"]["minimum"], json!(1));
        assert!(schema.get("required").is_none());
    }
}
