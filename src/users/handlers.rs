use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::{ApiError, AppError, MessageBody},
    state::AppState,
    users::dto::{PublicUser, RegisterRequest, UpdateRequest, UserResponse},
};

const REGISTERED: &str = "Usuário cadastrado com sucesso!";
const UPDATED: &str = "Usuário atualizado com sucesso!";

const REGISTER_FAILED: &str = "Erro interno no servidor.";
const LIST_FAILED: &str = "Erro ao listar usuários.";
const GET_FAILED: &str = "Erro ao buscar usuário.";
const UPDATE_FAILED: &str = "Erro ao atualizar usuário.";
const DELETE_FAILED: &str = "Erro ao excluir usuário.";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>, fallback: &str) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("malformed body: {e}")).into_api(fallback))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let RegisterRequest { name, email, password } = body(payload, REGISTER_FAILED)?;

    let user = state
        .users
        .register(name, email, password)
        .await
        .map_err(|e| e.into_api(REGISTER_FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: REGISTERED.into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = state
        .users
        .list_all()
        .await
        .map_err(|e| e.into_api(LIST_FAILED))?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .users
        .get_by_id(&id)
        .await
        .map_err(|e| e.into_api(GET_FAILED))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let UpdateRequest { name, email, password } = body(payload, UPDATE_FAILED)?;

    let user = state
        .users
        .update(&id, name, email, password)
        .await
        .map_err(|e| e.into_api(UPDATE_FAILED))?;

    Ok(Json(UserResponse {
        message: UPDATED.into(),
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let message = state
        .users
        .delete(&id)
        .await
        .map_err(|e| e.into_api(DELETE_FAILED))?;
    Ok(Json(MessageBody {
        message: message.into(),
    }))
}
