use crate::board::{build_board, BoardResponse};
use crate::errors::AppError;
use crate::models::{
    ClaimResponse, CompletionResponse, IssuesResponse, MemoryResponse, ProjectItemRequest,
    ProjectItemResponse, StatusResponse, TokenRequest,
};
use crate::progress::{memory_story, MEMORY_COUNT};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Json,
};
use tracing::info;

async fn current_board(state: &AppState) -> BoardResponse {
    let authenticated = state.github.has_token();
    let feed = state.feed.lock().await;
    let data = state.data.lock().await;
    build_board(&feed, &data.stats, authenticated)
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&current_board(&state).await))
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<BoardResponse> {
    Json(current_board(&state).await)
}

pub async fn get_issues(State(state): State<AppState>) -> Json<IssuesResponse> {
    let feed = state.feed.lock().await;
    Json(IssuesResponse {
        source: feed.source(),
        partial: feed.is_partial(),
        count: feed.issues.len(),
        issues: feed.issues.clone(),
    })
}

pub async fn refresh(State(state): State<AppState>) -> Json<BoardResponse> {
    state.refresh().await;
    Json(current_board(&state).await)
}

pub async fn refresh_form(State(state): State<AppState>) -> Redirect {
    state.refresh().await;
    Redirect::to("/")
}

pub async fn complete_task(
    State(state): State<AppState>,
    Path(number): Path<u64>,
) -> Result<Json<CompletionResponse>, AppError> {
    let closed = state.github.close_issue(number).await?;

    let mut data = state.data.lock().await;
    let report = data.stats.complete_issue(&closed);
    persist_data(&state.data_path, &data).await?;
    let stats = data.stats.clone();
    drop(data);

    state.feed.lock().await.replace_issue(closed);
    info!(
        "issue #{number} completed: +{} xp, +{} coins, unlocked {:?}",
        report.xp, report.coins, report.unlocked
    );

    Ok(Json(CompletionResponse {
        issue: number,
        xp: report.xp,
        coins: report.coins,
        level: stats.level,
        notifications: report.notifications(),
        unlocked: report.unlocked,
        stats,
    }))
}

pub async fn claim_task(
    State(state): State<AppState>,
    Path(number): Path<u64>,
) -> Result<Json<ClaimResponse>, AppError> {
    let user = state.github.current_user().await?;
    state
        .github
        .add_assignees(number, std::slice::from_ref(&user.login))
        .await?;
    info!("issue #{number} claimed by {}", user.login);

    Ok(Json(ClaimResponse {
        issue: number,
        message: format!("Task #{number} claimed! Get to work, chosen undead!"),
        assignee: user.login,
    }))
}

pub async fn get_memory(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<MemoryResponse>, AppError> {
    if id == 0 || id > MEMORY_COUNT {
        return Err(AppError::not_found(format!("there is no memory fragment #{id}")));
    }
    if !state.data.lock().await.stats.has_memory(id) {
        return Err(AppError::not_found(format!("memory fragment #{id} is still locked")));
    }

    Ok(Json(MemoryResponse {
        id,
        title: format!("Memory Fragment #{id}"),
        story: memory_story(id),
    }))
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let mut errors = Vec::new();

    let repository = match state.github.repository().await {
        Ok(repo) => Some(repo),
        Err(err) => {
            errors.push(format!("repository: {err}"));
            None
        }
    };
    let rate_limit = match state.github.rate_limit().await {
        Ok(rate) => Some(rate),
        Err(err) => {
            errors.push(format!("rate limit: {err}"));
            None
        }
    };

    Json(StatusResponse {
        token_configured: state.github.has_token(),
        open_issues: repository.as_ref().map(|repo| repo.open_issues_count),
        visibility: repository.as_ref().and_then(|repo| repo.visibility.clone()),
        repository: repository.map(|repo| repo.full_name),
        rate_limit,
        errors,
    })
}

pub async fn save_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<BoardResponse>, AppError> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(AppError::bad_request("token must not be empty"));
    }

    {
        let mut data = state.data.lock().await;
        data.github_token = Some(token.to_string());
        persist_data(&state.data_path, &data).await?;
    }
    state.github.set_stored_token(Some(token.to_string()));
    info!("stored a GitHub token, refreshing issues");

    state.refresh().await;
    Ok(Json(current_board(&state).await))
}

pub async fn add_project_item(
    State(state): State<AppState>,
    Json(payload): Json<ProjectItemRequest>,
) -> Result<Json<ProjectItemResponse>, AppError> {
    if payload.project_id.trim().is_empty() || payload.content_id.trim().is_empty() {
        return Err(AppError::bad_request("project_id and content_id are required"));
    }
    let item_id = state
        .github
        .add_project_item(&payload.project_id, &payload.content_id)
        .await?;
    Ok(Json(ProjectItemResponse { item_id }))
}
