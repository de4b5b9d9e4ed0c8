//! Communities, chat, competitions and referrals

use axum::extract::State;
use pp_core::logging::operations;
use pp_store::entities::{
    ChatMessageEntity, CommunityEntity, CommunityMemberEntity, CompetitionEntity, CompetitionEntryEntity,
    NewCompetition, ReferralEntity,
};
use pp_store::services::ReferralOutcome;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthClaims;
use crate::dto::{
    ApplyReferralRequest, CreateCommunityRequest, CreateCompetitionRequest, LimitQuery, MessagesQuery,
    PostMessageRequest, ScoreRequest,
};
use crate::error::ApiResult;
use crate::handlers::{invalidate_players, tracked};
use crate::response::{ApiJson, ApiPath, ApiQuery, ApiResponse};
use crate::state::AppState;

// ============================================
// Communities
// ============================================

pub async fn create_community(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<CreateCommunityRequest>,
) -> ApiResult<ApiResponse<CommunityEntity>> {
    let community = state
        .services
        .social
        .create_community(claims.player_id()?, &req.name, &req.description)
        .await?;
    Ok(ApiResponse::created(community))
}

pub async fn list_communities(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<CommunityEntity>>> {
    let communities = state.services.social.list_communities(query.limit).await?;
    Ok(ApiResponse::ok(communities))
}

pub async fn get_community(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CommunityEntity>> {
    let community = state.services.social.get_community(id).await?;
    Ok(ApiResponse::ok(community))
}

pub async fn join_community(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CommunityMemberEntity>> {
    let member = state
        .services
        .social
        .join_community(id, claims.player_id()?)
        .await?;
    Ok(ApiResponse::ok(member).with_message("Joined community"))
}

pub async fn leave_community(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state
        .services
        .social
        .leave_community(id, claims.player_id()?)
        .await?;
    Ok(ApiResponse::ok(()).with_message("Left community"))
}

pub async fn members(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<CommunityMemberEntity>>> {
    let members = state.services.social.members(id, query.limit).await?;
    Ok(ApiResponse::ok(members))
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<PostMessageRequest>,
) -> ApiResult<ApiResponse<ChatMessageEntity>> {
    let message = state
        .services
        .social
        .post_message(id, claims.player_id()?, &req.content)
        .await?;
    Ok(ApiResponse::created(message))
}

pub async fn messages(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<MessagesQuery>,
) -> ApiResult<ApiResponse<Vec<ChatMessageEntity>>> {
    let messages = state
        .services
        .social
        .messages(id, claims.player_id()?, query.before, query.limit)
        .await?;
    Ok(ApiResponse::ok(messages))
}

// ============================================
// Competitions
// ============================================

pub async fn create_competition(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<CreateCompetitionRequest>,
) -> ApiResult<ApiResponse<CompetitionEntity>> {
    let new = NewCompetition {
        name: req.name,
        description: req.description,
        creator_id: claims.player_id()?,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        entry_fee: req.entry_fee,
        prize_pool: req.prize_pool,
    };
    let competition = state
        .services
        .social
        .create_competition(new, claims.is_admin())
        .await?;
    Ok(ApiResponse::created(competition))
}

pub async fn list_competitions(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<CompetitionEntity>>> {
    let competitions = state.services.social.list_competitions(query.limit).await?;
    Ok(ApiResponse::ok(competitions))
}

pub async fn get_competition(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CompetitionEntity>> {
    let competition = state.services.social.get_competition(id).await?;
    Ok(ApiResponse::ok(competition))
}

/// Join and pay the entry fee into the prize pool
pub async fn join_competition(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CompetitionEntryEntity>> {
    let player_id = claims.player_id()?;
    let entry = state.services.social.join_competition(id, player_id).await?;
    invalidate_players(&state, &[player_id]).await;
    Ok(ApiResponse::ok(entry).with_message("Joined competition"))
}

pub async fn submit_score(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ScoreRequest>,
) -> ApiResult<ApiResponse<CompetitionEntryEntity>> {
    let entry = state
        .services
        .social
        .submit_score(id, claims.player_id()?, req.score)
        .await?;
    Ok(ApiResponse::ok(entry))
}

pub async fn standings(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<CompetitionEntryEntity>>> {
    let standings = state.services.social.standings(id, query.limit).await?;
    Ok(ApiResponse::ok(standings))
}

/// Pay the prize pool to the top entrant; creator or admin only
pub async fn finalize_competition(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<CompetitionEntity>> {
    let competition = tracked(
        operations::COMPETITION_FINALIZE,
        state
            .services
            .social
            .finalize_competition(id, claims.player_id()?, claims.is_admin())
            .await,
    )?;
    if let Some(winner) = competition.winner_id {
        invalidate_players(&state, &[winner]).await;
    }
    Ok(ApiResponse::ok(competition).with_message("Competition finalized"))
}

// ============================================
// Referrals
// ============================================

pub async fn apply_referral(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
    ApiJson(req): ApiJson<ApplyReferralRequest>,
) -> ApiResult<ApiResponse<ReferralOutcome>> {
    let player_id = claims.player_id()?;
    let outcome = tracked(
        operations::REFERRAL,
        state.services.social.apply_referral(player_id, &req.code).await,
    )?;
    invalidate_players(&state, &[player_id, outcome.referrer_id]).await;
    Ok(ApiResponse::ok(outcome).with_message("Referral applied"))
}

pub async fn referrals(
    State(state): State<Arc<AppState>>,
    claims: AuthClaims,
) -> ApiResult<ApiResponse<Vec<ReferralEntity>>> {
    let referrals = state.services.social.referrals(claims.player_id()?).await?;
    Ok(ApiResponse::ok(referrals))
}
