/// User management endpoints
///
/// Invites, invite acceptance, promotion, profile updates, removal and the
/// company roster. Everything except invite acceptance needs a JWT; the
/// invite token itself is the credential for acceptance.
///
/// # Endpoints
///
/// - `POST /v1/companies/:company_id/invites` - Invite an email (admin)
/// - `GET /v1/companies/:company_id/users` - Company roster (member)
/// - `POST /v1/invites/:token_id/accept` - Activate an invited user
/// - `POST /v1/users/:user_id/promote` - Make a user admin (admin)
/// - `GET /v1/authenticated-user/:email` - Profile of a colleague or self
/// - `POST /v1/manage-user/:id` - Invite, accept or promote depending on
///   what `id` names
/// - `PUT /v1/manage-user/:id` - Update names and email
/// - `DELETE /v1/manage-user/:company_id` - Remove users (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    serialization::{roster, UserListItem, UserProfile, UserWithToken},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use imcm_shared::{
    accounts::invite::{self as workflow, AcceptInvite, ManageTarget, UpdateUser},
    auth::{
        authorization::{require_company_admin, require_company_member},
        middleware::AuthContext,
    },
    models::user::User,
};
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;
use validator::Validate;

/// Invite request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    /// Email address of the invitee
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Accept-invite request
///
/// Absent fields deserialize empty and are reported by the workflow.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcceptInviteRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub password: String,
}

impl From<AcceptInviteRequest> for AcceptInvite {
    fn from(req: AcceptInviteRequest) -> Self {
        Self {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            password: req.password,
        }
    }
}

/// Profile update request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
        }
    }
}

/// Ids to remove: a single id or a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DeleteUsersRequest {
    One(Uuid),
    Many(Vec<Uuid>),
}

impl DeleteUsersRequest {
    pub fn into_ids(self) -> Vec<Uuid> {
        match self {
            DeleteUsersRequest::One(id) => vec![id],
            DeleteUsersRequest::Many(ids) => ids,
        }
    }
}

async fn load_user(state: &AppState, user_id: Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cannot find user".to_string()))
}

fn user_company(user: &User) -> ApiResult<Uuid> {
    user.company_id
        .ok_or_else(|| ApiError::NotFound("User has no company".to_string()))
}

/// Decodes a body whose shape depends on the route branch taken
fn parse_body<T: DeserializeOwned>(body: Option<Json<serde_json::Value>>) -> ApiResult<T> {
    let value = body
        .map(|Json(value)| value)
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

    serde_json::from_value(value).map_err(|e| ApiError::validation([e.to_string()]))
}

async fn invite(
    state: &AppState,
    auth: &AuthContext,
    company_id: Uuid,
    req: InviteRequest,
) -> ApiResult<Vec<UserListItem>> {
    req.validate()?;
    require_company_admin(&state.db, auth, company_id).await?;

    let outcome = workflow::invite_user(
        &state.db,
        state.mailer.as_ref(),
        &state.config.accounts,
        company_id,
        &req.email,
    )
    .await?;

    tracing::info!(
        company_id = %company_id,
        invited_by = %auth.user_id,
        token_id = %outcome.token.id,
        renewed = outcome.renewed,
        "Invite sent"
    );

    Ok(roster(&outcome.roster))
}

async fn accept(state: &AppState, token_id: Uuid, req: AcceptInviteRequest) -> ApiResult<UserWithToken> {
    let user = workflow::accept_invite(&state.db, token_id, req.into()).await?;
    Ok(UserWithToken::issue(&user, state.jwt_secret())?)
}

async fn promote(state: &AppState, auth: &AuthContext, user_id: Uuid) -> ApiResult<Vec<UserListItem>> {
    let target = load_user(state, user_id).await?;
    require_company_admin(&state.db, auth, user_company(&target)?).await?;

    let users = workflow::promote_user(&state.db, user_id).await?;
    Ok(roster(&users))
}

/// Invite a user to a company
///
/// Inviting an email that already has a pending invite renews it and
/// sends a reminder instead.
///
/// # Endpoint
///
/// ```text
/// POST /v1/companies/:company_id/invites
/// Authorization: Bearer <access token>
///
/// { "email": "new.agent@acme.test" }
/// ```
///
/// # Response
///
/// The company roster, including the pending invitee.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin of the company
/// - `409 Conflict`: Email used by another account, or no admin to send from
/// - `422 Unprocessable Entity`: Invalid email
/// - `503 Service Unavailable`: Mail could not be sent (the invite is kept)
pub async fn invite_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    payload: Result<Json<InviteRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<UserListItem>>> {
    let Json(req) = payload?;
    Ok(Json(invite(&state, &auth, company_id, req).await?))
}

/// Activate an invited user
///
/// # Endpoint
///
/// ```text
/// POST /v1/invites/:token_id/accept
///
/// {
///   "email": "new.agent@acme.test",
///   "firstName": "Sam",
///   "lastName": "Rivera",
///   "phone": "555-0101",
///   "password": "chosen-password"
/// }
/// ```
///
/// # Response
///
/// The activated user with a token pair.
///
/// # Errors
///
/// - `404 Not Found`: No invite with this id for this email
/// - `410 Gone`: The invite has expired
/// - `422 Unprocessable Entity`: Missing fields
pub async fn accept_invite(
    State(state): State<AppState>,
    Path(token_id): Path<Uuid>,
    payload: Result<Json<AcceptInviteRequest>, JsonRejection>,
) -> ApiResult<Json<UserWithToken>> {
    let Json(req) = payload?;
    Ok(Json(accept(&state, token_id, req).await?))
}

/// Make a user an admin of their company
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin of the user's company
/// - `404 Not Found`: Unknown user
/// - `422 Unprocessable Entity`: The user has not accepted their invite yet
pub async fn promote_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserListItem>>> {
    Ok(Json(promote(&state, &auth, user_id).await?))
}

/// Every user of a company
pub async fn company_roster(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserListItem>>> {
    require_company_member(&state.db, &auth, company_id).await?;

    let users = workflow::company_roster(&state.db, company_id).await?;
    Ok(Json(roster(&users)))
}

/// Profile of a user looked up by email
///
/// Callers see themselves and members of their own company.
///
/// # Errors
///
/// - `403 Forbidden`: The user belongs to another company
/// - `404 Not Found`: No user with this email
pub async fn authenticated_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(email): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cannot find user".to_string()))?;

    if user.id != auth.user_id {
        let company_id = user
            .company_id
            .ok_or_else(|| ApiError::Forbidden("Not authorized to access this resource".to_string()))?;
        require_company_member(&state.db, &auth, company_id).await?;
    }

    Ok(Json(UserProfile::from(&user)))
}

/// Legacy entry point that acts on whatever `id` names
///
/// | `id` names    | Action        | Body                  | Response            |
/// |---------------|---------------|-----------------------|---------------------|
/// | a company     | invite        | `{ "email" }`         | roster              |
/// | an invite     | accept        | accept-invite fields  | user with tokens    |
/// | a user        | promote       | ignored               | roster              |
///
/// # Errors
///
/// - `404 Not Found`: `id` names nothing
/// - otherwise as for the action taken
pub async fn manage_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Option<Json<serde_json::Value>>,
) -> ApiResult<Response> {
    let response = match workflow::resolve_target(&state.db, id).await? {
        ManageTarget::Company(company_id) => {
            let req = parse_body::<InviteRequest>(body)?;
            Json(invite(&state, &auth, company_id, req).await?).into_response()
        }
        ManageTarget::InviteToken(token_id) => {
            let req = parse_body::<AcceptInviteRequest>(body)?;
            Json(accept(&state, token_id, req).await?).into_response()
        }
        ManageTarget::User(user_id) => Json(promote(&state, &auth, user_id).await?).into_response(),
    };

    Ok(response)
}

/// Update a user's names and email
///
/// Callers may update themselves, and admins may update members of their
/// company. Updating yourself returns a fresh token pair; updating someone
/// else returns their profile.
///
/// # Errors
///
/// - `403 Forbidden`: Not yourself and not an admin of the user's company
/// - `404 Not Found`: Unknown user
/// - `409 Conflict`: Email used by another account
/// - `422 Unprocessable Entity`: Missing names or invalid email
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    let target = load_user(&state, user_id).await?;

    if target.id != auth.user_id {
        require_company_admin(&state.db, &auth, user_company(&target)?).await?;
    }

    let user = workflow::update_user(&state.db, user_id, req.into()).await?;

    let response = if user.id == auth.user_id {
        Json(UserWithToken::issue(&user, state.jwt_secret())?).into_response()
    } else {
        Json(UserProfile::from(&user)).into_response()
    };

    Ok(response)
}

/// Remove users from a company
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/manage-user/:company_id
/// Authorization: Bearer <access token>
///
/// ["8f14e45f-...", "c9f0f895-..."]
/// ```
///
/// A single JSON string id is accepted as well. Ids of other companies'
/// users are ignored.
///
/// # Response
///
/// What is left of the roster.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin of the company
/// - `404 Not Found`: A single id that matches no user of the company
/// - `422 Unprocessable Entity`: Empty list or malformed ids
pub async fn delete_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    payload: Result<Json<DeleteUsersRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<UserListItem>>> {
    let Json(req) = payload?;
    require_company_admin(&state.db, &auth, company_id).await?;

    let ids = req.into_ids();
    let users = workflow::delete_users(&state.db, company_id, &ids).await?;

    tracing::info!(company_id = %company_id, removed_by = %auth.user_id, "Users removed");
    Ok(Json(roster(&users)))
}
