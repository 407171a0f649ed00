//! Establishment JSON endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use stylecore_core::{EstablishmentId, UserId};

use crate::error::{AppError, FieldErrors};
use crate::middleware::{CurrentTenant, RequireAuth};
use crate::models::{CurrentUser, Establishment, NewEstablishment, User};
use crate::services::policy::EstablishmentPolicy;
use crate::state::AppState;

/// Body of `POST /establishments`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEstablishment {
    #[validate(length(min = 1, max = 255, message = "The name must be 1 to 255 characters."))]
    pub name: String,
    #[validate(length(max = 2000, message = "The description may not be greater than 2000 characters."))]
    pub description: Option<String>,
}

/// Body of `POST /establishments/{id}/staff`.
#[derive(Debug, Deserialize)]
pub struct AddStaff {
    pub user_id: UserId,
}

/// An establishment with its staff.
#[derive(Debug, Serialize)]
pub struct EstablishmentView {
    #[serde(flatten)]
    pub establishment: Establishment,
    pub staff: Vec<UserId>,
}

async fn acting_user(
    state: &AppState,
    tenant: &CurrentTenant,
    current: &CurrentUser,
) -> Result<User, AppError> {
    state
        .store()
        .find_user(&tenant.scope(), current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("session user not found".to_string()))
}

async fn load(
    state: &AppState,
    tenant: &CurrentTenant,
    id: EstablishmentId,
) -> Result<Establishment, AppError> {
    state
        .store()
        .find_establishment(&tenant.scope(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("establishment {id}")))
}

/// Open an establishment owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    RequireAuth(current): RequireAuth,
    Json(body): Json<CreateEstablishment>,
) -> Result<Response, AppError> {
    let user = acting_user(&state, &tenant, &current).await?;
    if !EstablishmentPolicy::create(&user) {
        return Err(AppError::Forbidden(
            "only owners can create establishments".to_string(),
        ));
    }

    let name = body.name.trim().to_owned();
    let body = CreateEstablishment {
        description: body
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty()),
        name,
    };
    body.validate()
        .map_err(|e| AppError::Validation(FieldErrors::from(e)))?;

    let establishment = state
        .store()
        .create_establishment(
            &tenant.scope(),
            NewEstablishment {
                tenant_id: None,
                owner_id: user.id,
                name: body.name,
                description: body.description,
            },
        )
        .await?;

    tracing::info!(
        establishment_id = %establishment.id,
        owner_id = %user.id,
        "Establishment created"
    );
    Ok((StatusCode::CREATED, Json(establishment)).into_response())
}

/// Show an establishment to its owner, staff and managers.
pub async fn show(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<EstablishmentView>, AppError> {
    let user = acting_user(&state, &tenant, &current).await?;
    let establishment = load(&state, &tenant, EstablishmentId::new(id)).await?;
    let staff = state
        .store()
        .staff_ids(&tenant.scope(), establishment.id)
        .await?;

    if !EstablishmentPolicy::view(&user, &establishment, &staff) {
        return Err(AppError::Forbidden(format!("establishment {id}")));
    }

    Ok(Json(EstablishmentView {
        establishment,
        staff,
    }))
}

/// Add a user of the same tenant to the staff.
pub async fn add_staff(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
    Json(body): Json<AddStaff>,
) -> Result<StatusCode, AppError> {
    let user = acting_user(&state, &tenant, &current).await?;
    let establishment = load(&state, &tenant, EstablishmentId::new(id)).await?;

    if !EstablishmentPolicy::update(&user, &establishment) {
        return Err(AppError::Forbidden(format!("establishment {id}")));
    }

    state
        .store()
        .add_staff(&tenant.scope(), establishment.id, body.user_id)
        .await?;

    tracing::info!(
        establishment_id = %establishment.id,
        staff_id = %body.user_id,
        "Staff member added"
    );
    Ok(StatusCode::NO_CONTENT)
}
