//! The endpoint table.
//!
//! Every operation the gateway exposes is one row in [`ENDPOINTS`]. A row
//! names the local route, the upstream route it forwards to, the parameters
//! it recognizes (with their defaults) and whether it takes a JSON body.
//!
//! # Design Decisions
//! - Built at compile time, never mutated
//! - Upstream paths are kept exactly as the remote API expects them, including
//!   the mix of versioned (`/v1/...`) and unversioned routes
//! - Placeholder names are shared between the local and upstream templates

use axum::http::Method;

/// Identifies one upstream operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationId {
    GetUsers,
    GetUser,
    CreateOrUpdateUser,
    DeleteUser,
    LogInWithKey,
    LogIn,
    LogInServer,
    CreateUserApiKey,
    GetStations,
    GetStation,
    CreateStation,
    UpdateStation,
    DeleteStation,
    GetStationConfig,
    SetStationConfig,
    DeleteStationConfig,
    GetStationEvents,
    CreateStationEvent,
    GetEvent,
    UpdateStationEvent,
    DeleteStationEvent,
    AddRoleToUser,
    RemoveRoleFromUser,
    CreateRole,
    DeleteRole,
    BanUser,
    UnbanUser,
    GetStationBans,
}

impl OperationId {
    /// Stable snake_case name used in logs, metrics and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            OperationId::GetUsers => "get_users",
            OperationId::GetUser => "get_user",
            OperationId::CreateOrUpdateUser => "create_or_update_user",
            OperationId::DeleteUser => "delete_user",
            OperationId::LogInWithKey => "log_in_with_key",
            OperationId::LogIn => "log_in",
            OperationId::LogInServer => "log_in_server",
            OperationId::CreateUserApiKey => "create_user_api_key",
            OperationId::GetStations => "get_stations",
            OperationId::GetStation => "get_station",
            OperationId::CreateStation => "create_station",
            OperationId::UpdateStation => "update_station",
            OperationId::DeleteStation => "delete_station",
            OperationId::GetStationConfig => "get_station_config",
            OperationId::SetStationConfig => "set_station_config",
            OperationId::DeleteStationConfig => "delete_station_config",
            OperationId::GetStationEvents => "get_station_events",
            OperationId::CreateStationEvent => "create_station_event",
            OperationId::GetEvent => "get_event",
            OperationId::UpdateStationEvent => "update_station_event",
            OperationId::DeleteStationEvent => "delete_station_event",
            OperationId::AddRoleToUser => "add_role_to_user",
            OperationId::RemoveRoleFromUser => "remove_role_from_user",
            OperationId::CreateRole => "create_role",
            OperationId::DeleteRole => "delete_role",
            OperationId::BanUser => "ban_user",
            OperationId::UnbanUser => "unban_user",
            OperationId::GetStationBans => "get_station_bans",
        }
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared shape of a parameter, with its default when it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool(bool),
    Int(i64),
    /// Free text. Required: there is no default.
    Str,
}

/// Where a parameter lands in the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamTarget {
    Query,
    /// A field of the upstream JSON body object.
    BodyField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub target: ParamTarget,
}

impl ParamSpec {
    const fn flag(name: &'static str, default: bool) -> Self {
        Self { name, kind: ParamKind::Bool(default), target: ParamTarget::Query }
    }

    const fn int(name: &'static str, default: i64) -> Self {
        Self { name, kind: ParamKind::Int(default), target: ParamTarget::Query }
    }

    const fn text(name: &'static str, target: ParamTarget) -> Self {
        Self { name, kind: ParamKind::Str, target }
    }

    /// The default value rendered as it goes on the wire, if there is one.
    pub fn default_value(&self) -> Option<String> {
        match self.kind {
            ParamKind::Bool(b) => Some(b.to_string()),
            ParamKind::Int(i) => Some(i.to_string()),
            ParamKind::Str => None,
        }
    }
}

/// Whether an operation forwards a caller-supplied JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    None,
    Json,
}

/// One local route bound to one upstream route.
#[derive(Debug)]
pub struct Endpoint {
    pub id: OperationId,
    pub method: Method,
    /// Local route template, axum syntax (`/users/{user_id}`).
    pub local_path: &'static str,
    /// Upstream route template, same placeholder names as `local_path`.
    pub upstream_path: &'static str,
    pub params: &'static [ParamSpec],
    pub body: BodyKind,
}

impl Endpoint {
    /// Look up a declared parameter by name.
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Placeholder names in the upstream template, in order.
    pub fn placeholders(&self) -> impl Iterator<Item = &'static str> {
        placeholders(self.upstream_path)
    }
}

/// Yields the `{name}` placeholders of a route template.
pub fn placeholders(template: &'static str) -> impl Iterator<Item = &'static str> {
    template.split('/').filter_map(placeholder_name)
}

/// Returns `name` when `segment` is a `{name}` placeholder.
pub fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}

const NO_PARAMS: &[ParamSpec] = &[];

const USER_LIST_PARAMS: &[ParamSpec] = &[
    ParamSpec::flag("include_roles", false),
    ParamSpec::flag("include_permissions", false),
    ParamSpec::int("page_size", 100),
    ParamSpec::int("page", 1),
];

const USER_PARAMS: &[ParamSpec] = &[
    ParamSpec::flag("include_roles", false),
    ParamSpec::flag("include_permissions", false),
    ParamSpec::flag("include_bans", false),
];

const STATION_LIST_PARAMS: &[ParamSpec] = &[
    ParamSpec::flag("include_config", false),
    ParamSpec::flag("include_deployments", false),
    ParamSpec::flag("include_offline_stations", true),
    ParamSpec::int("page_size", 100),
    ParamSpec::int("page", 1),
];

const STATION_PARAMS: &[ParamSpec] = &[
    ParamSpec::flag("include_config", true),
    ParamSpec::flag("include_deployments", true),
];

const STATION_EVENT_PARAMS: &[ParamSpec] = &[ParamSpec::flag("get_past_events", false)];

const BAN_PARAMS: &[ParamSpec] = &[
    ParamSpec::text("duration", ParamTarget::Query),
    ParamSpec::text("reason", ParamTarget::BodyField),
];

const BAN_LIST_PARAMS: &[ParamSpec] = &[
    ParamSpec::flag("include_revoked", false),
    ParamSpec::flag("include_expired", false),
];

const fn ep(
    id: OperationId,
    method: Method,
    local_path: &'static str,
    upstream_path: &'static str,
    params: &'static [ParamSpec],
    body: BodyKind,
) -> Endpoint {
    Endpoint { id, method, local_path, upstream_path, params, body }
}

/// Every operation the gateway forwards.
pub static ENDPOINTS: &[Endpoint] = &[
    // Users
    ep(OperationId::GetUsers, Method::GET, "/users", "/v1/users", USER_LIST_PARAMS, BodyKind::None),
    ep(OperationId::GetUser, Method::GET, "/users/{user_id}", "/v1/users/{user_id}", USER_PARAMS, BodyKind::None),
    ep(OperationId::CreateOrUpdateUser, Method::POST, "/users", "/users", NO_PARAMS, BodyKind::Json),
    ep(OperationId::DeleteUser, Method::DELETE, "/users/{user_id}", "/users/{user_id}", NO_PARAMS, BodyKind::None),
    ep(OperationId::LogInWithKey, Method::POST, "/users/login-with-key", "/users/log_in_with_key", NO_PARAMS, BodyKind::None),
    ep(OperationId::LogIn, Method::POST, "/users/login", "/users/log_in", NO_PARAMS, BodyKind::Json),
    ep(OperationId::LogInServer, Method::POST, "/users/login-server", "/users/log_in_server", NO_PARAMS, BodyKind::Json),
    ep(OperationId::CreateUserApiKey, Method::POST, "/users/{user_id}/api-key", "/users/{user_id}/api_key", NO_PARAMS, BodyKind::None),
    // Stations
    ep(OperationId::GetStations, Method::GET, "/stations", "/v1/stations", STATION_LIST_PARAMS, BodyKind::None),
    ep(OperationId::GetStation, Method::GET, "/stations/{station_id}", "/stations/{station_id}", STATION_PARAMS, BodyKind::None),
    ep(OperationId::CreateStation, Method::POST, "/stations", "/stations/create", NO_PARAMS, BodyKind::Json),
    ep(OperationId::UpdateStation, Method::PATCH, "/stations/{station_id}", "/stations/{station_id}", NO_PARAMS, BodyKind::Json),
    ep(OperationId::DeleteStation, Method::DELETE, "/stations/{station_id}", "/stations/{station_id}", NO_PARAMS, BodyKind::None),
    // Station config
    ep(OperationId::GetStationConfig, Method::GET, "/stations/{station_id}/config", "/stations/{station_id}/config", NO_PARAMS, BodyKind::None),
    ep(OperationId::SetStationConfig, Method::POST, "/stations/{station_id}/config", "/stations/{station_id}/config", NO_PARAMS, BodyKind::Json),
    ep(OperationId::DeleteStationConfig, Method::DELETE, "/stations/{station_id}/config", "/stations/{station_id}/config", NO_PARAMS, BodyKind::Json),
    // Station events
    ep(OperationId::GetStationEvents, Method::GET, "/stations/{station_id}/events", "/v1/stations/{station_id}/events", STATION_EVENT_PARAMS, BodyKind::None),
    ep(OperationId::CreateStationEvent, Method::POST, "/stations/{station_id}/events", "/v1/stations/{station_id}/event", NO_PARAMS, BodyKind::Json),
    ep(OperationId::GetEvent, Method::GET, "/events/{event_id}", "/v1/events/{event_id}", NO_PARAMS, BodyKind::None),
    ep(OperationId::UpdateStationEvent, Method::PATCH, "/stations/{station_id}/events/{event_id}", "/v1/stations/{station_id}/event/{event_id}", NO_PARAMS, BodyKind::Json),
    ep(OperationId::DeleteStationEvent, Method::DELETE, "/stations/{station_id}/events/{event_id}", "/v1/stations/{station_id}/event/{event_id}", NO_PARAMS, BodyKind::None),
    // Roles
    ep(OperationId::AddRoleToUser, Method::POST, "/stations/{station_id}/roles/{role_id}/assign/{user_id}", "/stations/{station_id}/users/{user_id}/roles/{role_id}", NO_PARAMS, BodyKind::None),
    ep(OperationId::RemoveRoleFromUser, Method::DELETE, "/stations/{station_id}/roles/{role_id}/remove/{user_id}", "/stations/{station_id}/users/{user_id}/role/{role_id}", NO_PARAMS, BodyKind::None),
    ep(OperationId::CreateRole, Method::POST, "/stations/{station_id}/roles", "/stations/{station_id}/roles", NO_PARAMS, BodyKind::Json),
    ep(OperationId::DeleteRole, Method::DELETE, "/stations/{station_id}/roles/{role_id}", "/stations/{station_id}/roles/{role_id}", NO_PARAMS, BodyKind::None),
    // Bans
    ep(OperationId::BanUser, Method::POST, "/stations/{station_id}/ban/{user_id}", "/v1/stations/{station_id}/users/{user_id}/ban", BAN_PARAMS, BodyKind::None),
    ep(OperationId::UnbanUser, Method::PATCH, "/stations/{station_id}/ban/{user_id}", "/v1/stations/{station_id}/users/{user_id}/unban", NO_PARAMS, BodyKind::None),
    ep(OperationId::GetStationBans, Method::GET, "/stations/{station_id}/bans", "/v1/stations/{station_id}/bans", BAN_LIST_PARAMS, BodyKind::None),
];

/// The table row for `id`.
pub fn endpoint(id: OperationId) -> &'static Endpoint {
    ENDPOINTS
        .iter()
        .find(|e| e.id == id)
        .unwrap_or_else(|| unreachable!("operation {id} has no endpoint row"))
}

/// Find an endpoint by its operation name (`get_stations`, ...).
pub fn find(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS.iter().find(|e| e.id.name() == name)
}
