//! Member management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppResult, ErrorResponse},
    models::{
        fine::Fine,
        member::{CreateMember, MemberDetail, MemberQuery, MemberSummary, UpdateMember},
    },
    AppState,
};

use super::{
    extract::{ValidatedJson, ValidatedQuery},
    response::{
        ApiResponse, CollectionResponse, FinesResponse, ListResponse, MemberCreatedResponse,
        MemberDetailResponse, MemberList, MessageResponse,
    },
};

/// Identifier of a newly created member
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberCreated {
    pub member_id: i32,
}

/// List members with search, filters and pagination
#[utoipa::path(
    get,
    path = "/api/members",
    tag = "members",
    params(MemberQuery),
    responses(
        (status = 200, description = "Paginated list of members", body = MemberList),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<MemberQuery>,
) -> AppResult<Json<ListResponse<MemberSummary>>> {
    let page = state.services.members.search(&query).await?;
    Ok(ListResponse::ok("Members retrieved successfully", page))
}

/// Get member details with loan counters and recent loans
#[utoipa::path(
    get,
    path = "/api/members/{id}",
    tag = "members",
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member details", body = MemberDetailResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<MemberDetail>>> {
    let member = state.services.members.get(id).await?;
    Ok(ApiResponse::ok("Member retrieved successfully", member))
}

/// List the fines of a member
#[utoipa::path(
    get,
    path = "/api/members/{id}/fines",
    tag = "members",
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Fines of the member", body = FinesResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    )
)]
pub async fn get_member_fines(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CollectionResponse<Fine>>> {
    let fines = state.services.members.fines(id).await?;
    Ok(CollectionResponse::ok("Fines retrieved successfully", fines))
}

/// Register a new member
#[utoipa::path(
    post,
    path = "/api/members",
    tag = "members",
    request_body = CreateMember,
    responses(
        (status = 201, description = "Member created", body = MemberCreatedResponse),
        (status = 409, description = "Membership number or email already exists", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<AppState>,
    ValidatedJson(member): ValidatedJson<CreateMember>,
) -> AppResult<(StatusCode, Json<ApiResponse<MemberCreated>>)> {
    let member_id = state.services.members.create(&member).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Member created successfully", MemberCreated { member_id }),
    ))
}

/// Update a member
#[utoipa::path(
    put,
    path = "/api/members/{id}",
    tag = "members",
    params(("id" = i32, Path, description = "Member ID")),
    request_body = UpdateMember,
    responses(
        (status = 200, description = "Member updated", body = MessageResponse),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 409, description = "Membership number or email already exists", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(patch): ValidatedJson<UpdateMember>,
) -> AppResult<Json<MessageResponse>> {
    state.services.members.update(id, &patch).await?;
    Ok(MessageResponse::ok("Member updated successfully"))
}

/// Deactivate a member with no active loan
#[utoipa::path(
    delete,
    path = "/api/members/{id}",
    tag = "members",
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member deactivated", body = MessageResponse),
        (status = 400, description = "Member has active loans", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.members.delete(id).await?;
    Ok(MessageResponse::ok("Member deactivated successfully"))
}
