//! Inline editing workspace.
//!
//! Each operator session gets its own in-process editing controller holding
//! the loaded rows, per-row drafts and the single focused field. Sessions of
//! one tenant share the stored rows but never edit state; the last save wins.
//! Handlers lock only their session's controller.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    ApplicationResponse, EditableField, NewApplication, TenantId, UpdateStatusRequest,
    VisaApplication,
};
use domain::services::inline_edit::delete_prompt;
use domain::services::{ApplicationStore, InlineEditController, WorkspaceView};
use domain::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::applications::ListApplicationsParams;
use super::local_now;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Session;

type SharedController = Arc<Mutex<InlineEditController>>;

struct WorkspaceEntry {
    controller: SharedController,
    last_used: Instant,
    /// Set when the tenant's rows changed outside this session.
    stale: bool,
}

/// Editing controllers keyed by session.
pub struct WorkspaceRegistry {
    idle_timeout: Duration,
    workspaces: Mutex<HashMap<Session, WorkspaceEntry>>,
}

impl WorkspaceRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            workspaces: Mutex::new(HashMap::new()),
        }
    }

    /// The session's controller, created and loaded on first use.
    ///
    /// Workspaces idle for longer than the timeout are dropped first. A stale
    /// workspace is reloaded before it is handed out; if that reload fails the
    /// rows already held are kept. A failed first load is returned and nothing
    /// is registered, so the next call retries.
    pub async fn acquire(
        &self,
        session: &Session,
        store: &Arc<dyn ApplicationStore>,
    ) -> Result<SharedController, DomainError> {
        let existing = {
            let mut workspaces = self.workspaces.lock().await;
            self.evict_idle(&mut workspaces);
            workspaces.get_mut(session).map(|entry| {
                entry.last_used = Instant::now();
                (entry.controller.clone(), std::mem::take(&mut entry.stale))
            })
        };

        if let Some((controller, stale)) = existing {
            if stale {
                if let Err(e) = controller.lock().await.load().await {
                    warn!(tenant = %session.tenant, error = %e, "Workspace refresh failed");
                    self.mark_stale(session).await;
                }
            }
            return Ok(controller);
        }

        let mut controller = InlineEditController::new(store.clone(), session.tenant.clone());
        controller.load().await?;

        let mut workspaces = self.workspaces.lock().await;
        let shared = workspaces
            .entry(session.clone())
            .or_insert_with(|| {
                debug!(tenant = %session.tenant, "Workspace opened");
                WorkspaceEntry {
                    controller: Arc::new(Mutex::new(controller)),
                    last_used: Instant::now(),
                    stale: false,
                }
            })
            .controller
            .clone();
        Ok(shared)
    }

    /// Marks every workspace of `tenant` for reload, except `keep`.
    pub async fn invalidate_tenant(&self, tenant: &TenantId, keep: Option<&Session>) {
        let mut workspaces = self.workspaces.lock().await;
        for (session, entry) in workspaces.iter_mut() {
            if &session.tenant == tenant && Some(session) != keep {
                entry.stale = true;
            }
        }
    }

    async fn mark_stale(&self, session: &Session) {
        if let Some(entry) = self.workspaces.lock().await.get_mut(session) {
            entry.stale = true;
        }
    }

    fn evict_idle(&self, workspaces: &mut HashMap<Session, WorkspaceEntry>) {
        let before = workspaces.len();
        workspaces.retain(|_, entry| entry.last_used.elapsed() < self.idle_timeout);
        let evicted = before - workspaces.len();
        if evicted > 0 {
            debug!(evicted, "Idle workspaces dropped");
        }
    }

    pub async fn len(&self) -> usize {
        self.workspaces.lock().await.len()
    }
}

async fn controller_for(state: &AppState, session: &Session) -> Result<SharedController, ApiError> {
    Ok(state
        .workspaces
        .acquire(session, &state.applications)
        .await?)
}

/// Snapshot with the rows narrowed by the list parameters.
fn filtered_view(
    state: &AppState,
    controller: &InlineEditController,
    params: &ListApplicationsParams,
) -> Result<WorkspaceView, ApiError> {
    let query = params.to_query()?;
    let now = local_now(&state.config, params.utc_offset_minutes)?;

    let mut view = controller.snapshot();
    view.rows = controller
        .view(&query, now)
        .into_iter()
        .cloned()
        .map(ApplicationResponse::from)
        .collect();
    Ok(view)
}

#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub row_id: i64,
    pub field: EditableField,
}

#[derive(Debug, Serialize)]
pub struct FocusResponse {
    pub row_id: i64,
    pub field: EditableField,
    /// Current display text of the cell, used to seed the editor.
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteRowRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteRowResponse {
    pub deleted: bool,
    pub prompt: String,
}

/// Rows changed through `/api/v1/applications` or another session show up
/// here on the next request.
///
/// GET /api/v1/workspace?search=&status=&sort=&window=
pub async fn get_view(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListApplicationsParams>,
) -> Result<Json<WorkspaceView>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let controller = controller.lock().await;
    Ok(Json(filtered_view(&state, &controller, &params)?))
}

/// Refetch rows from the store. On failure the rows already shown stay.
///
/// POST /api/v1/workspace/reload
pub async fn reload(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<WorkspaceView>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let mut controller = controller.lock().await;
    controller.load().await?;
    Ok(Json(controller.snapshot()))
}

/// Create an application through the workspace and reload.
///
/// POST /api/v1/workspace/rows
pub async fn create_row(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<NewApplication>,
) -> Result<(StatusCode, Json<ApplicationResponse>), ApiError> {
    let controller = controller_for(&state, &session).await?;
    let created = controller.lock().await.create(request).await?;
    state
        .workspaces
        .invalidate_tenant(&session.tenant, Some(&session))
        .await;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// POST /api/v1/workspace/rows/:id/edit
pub async fn enter_edit_mode(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<WorkspaceView>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let mut controller = controller.lock().await;
    controller.enter_edit_mode(id)?;
    Ok(Json(controller.snapshot()))
}

/// Open one cell of a row in edit mode. Any other focus is dropped.
///
/// PUT /api/v1/workspace/focus
pub async fn focus(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<FocusRequest>,
) -> Result<Json<FocusResponse>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let value = controller
        .lock()
        .await
        .focus(request.row_id, request.field)?;

    Ok(Json(FocusResponse {
        row_id: request.row_id,
        field: request.field,
        value,
    }))
}

/// Commit the focused cell's raw input into the row's draft.
///
/// POST /api/v1/workspace/commit
pub async fn commit(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CommitRequest>,
) -> Result<Json<WorkspaceView>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let mut controller = controller.lock().await;
    let value = controller.commit_focused(&request.value)?;
    debug!(tenant = %session.tenant, value = ?value, "Cell committed");
    Ok(Json(controller.snapshot()))
}

/// Write the row's draft. Edit mode and focus are cleared even when the
/// write fails.
///
/// POST /api/v1/workspace/rows/:id/save
pub async fn save_row(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<WorkspaceView>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let mut controller = controller.lock().await;
    if let Some(saved) = controller.save_row(id).await? {
        info!(tenant = %session.tenant, application_id = saved.id, "Row saved");
        state
            .workspaces
            .invalidate_tenant(&session.tenant, Some(&session))
            .await;
    }
    Ok(Json(controller.snapshot()))
}

/// Discard the row's draft and restore the stored values.
///
/// POST /api/v1/workspace/rows/:id/cancel
pub async fn cancel_row(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<WorkspaceView>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let mut controller = controller.lock().await;
    controller.cancel_row(id).await?;
    Ok(Json(controller.snapshot()))
}

/// Write a status change at once, outside any draft.
///
/// PUT /api/v1/workspace/rows/:id/status
pub async fn change_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let updated = controller
        .lock()
        .await
        .change_status(id, request.status)
        .await?;
    state
        .workspaces
        .invalidate_tenant(&session.tenant, Some(&session))
        .await;
    Ok(Json(updated.into()))
}

/// Delete a row once confirmed. Without `confirm: true` nothing is written
/// and the confirmation prompt is returned.
///
/// POST /api/v1/workspace/rows/:id/delete
pub async fn delete_row(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(request): Json<DeleteRowRequest>,
) -> Result<Json<DeleteRowResponse>, ApiError> {
    let controller = controller_for(&state, &session).await?;
    let mut controller = controller.lock().await;

    let prompt = controller
        .applications()
        .iter()
        .find(|row| row.id == id)
        .map(delete_prompt)
        .ok_or(DomainError::ApplicationNotFound(id))?;

    let confirmed = request.confirm;
    let deleted = controller
        .delete(id, &move |_: &VisaApplication| confirmed)
        .await?;
    if deleted {
        state
            .workspaces
            .invalidate_tenant(&session.tenant, Some(&session))
            .await;
    }

    Ok(Json(DeleteRowResponse { deleted, prompt }))
}
