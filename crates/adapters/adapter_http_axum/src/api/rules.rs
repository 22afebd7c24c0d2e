//! JSON REST handlers for rules.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use growhub_app::ports::{RuleRepository, TriggerHistory};
use growhub_app::rule_engine::TickRunner;
use growhub_domain::id::RuleId;
use growhub_domain::rule::{Action, ConditionClause, Rule, Schedule};

use super::parse_rule_id;
use crate::error::ApiError;
use crate::state::AppState;

fn default_enabled() -> bool {
    true
}

fn default_priority() -> u8 {
    50
}

/// Request body for creating or replacing a rule.
///
/// Bookkeeping fields are not accepted; they belong to the engine.
#[derive(Deserialize)]
pub struct RuleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub cooldown_seconds: u32,
    #[serde(default)]
    pub conditions: Vec<ConditionClause>,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub else_actions: Vec<Action>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

impl RuleRequest {
    fn into_rule(self, id: RuleId) -> Rule {
        Rule {
            id,
            name: self.name,
            description: self.description,
            enabled: self.enabled,
            priority: self.priority,
            cooldown_seconds: self.cooldown_seconds,
            conditions: self.conditions,
            actions: self.actions,
            else_actions: self.else_actions,
            schedule: self.schedule,
            last_triggered: None,
            trigger_count: 0,
        }
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Rule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints returning one rule.
pub enum GetResponse {
    Ok(Json<Rule>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Rule>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/rules`: list all rules.
pub async fn list<R, H, E>(
    State(state): State<AppState<R, H, E>>,
) -> Result<ListResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let rules = state.rule_service.list_rules().await?;
    Ok(ListResponse::Ok(Json(rules)))
}

/// `GET /api/rules/{id}`: get rule by ID.
pub async fn get<R, H, E>(
    State(state): State<AppState<R, H, E>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let rule = state.rule_service.get_rule(parse_rule_id(&id)?).await?;
    Ok(GetResponse::Ok(Json(rule)))
}

/// `POST /api/rules`: create a new rule.
pub async fn create<R, H, E>(
    State(state): State<AppState<R, H, E>>,
    payload: Result<Json<RuleRequest>, JsonRejection>,
) -> Result<CreateResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let Json(req) = payload?;
    let created = state
        .rule_service
        .create_rule(req.into_rule(RuleId::new()))
        .await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/rules/{id}`: replace an existing rule.
pub async fn update<R, H, E>(
    State(state): State<AppState<R, H, E>>,
    Path(id): Path<String>,
    payload: Result<Json<RuleRequest>, JsonRejection>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let id = parse_rule_id(&id)?;
    let Json(req) = payload?;
    let updated = state
        .rule_service
        .update_rule(id, req.into_rule(id))
        .await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/rules/{id}`: delete a rule.
pub async fn delete<R, H, E>(
    State(state): State<AppState<R, H, E>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    state.rule_service.delete_rule(parse_rule_id(&id)?).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/rules/{id}/enable`
pub async fn enable<R, H, E>(
    State(state): State<AppState<R, H, E>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let rule = state
        .rule_service
        .toggle_rule(parse_rule_id(&id)?, true)
        .await?;
    Ok(GetResponse::Ok(Json(rule)))
}

/// `POST /api/rules/{id}/disable`
pub async fn disable<R, H, E>(
    State(state): State<AppState<R, H, E>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    R: RuleRepository + Send + Sync + 'static,
    H: TriggerHistory + Send + Sync + 'static,
    E: TickRunner + Send + Sync + 'static,
{
    let rule = state
        .rule_service
        .toggle_rule(parse_rule_id(&id)?, false)
        .await?;
    Ok(GetResponse::Ok(Json(rule)))
}
