use super::*;

pub async fn queue_wip_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(queue_id): Path<String>,
) -> ApiResult<Json<ProductionQueueWipResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = queue_service(&state)?;
    let summary = service
        .wip_summary(&queue_id)
        .await
        .map_err(map_queue_error)?;

    // The service reports depth itself once it has a recorder.
    if !service.emits_queue_depth()
        && let Some(recorder) = state.queue_depth_recorder.as_ref()
        && let Err(error) = recorder
            .record_queue_depth(&summary.queue_id, summary.total, &summary.status_counts)
            .await
    {
        tracing::warn!(queue_id = %summary.queue_id, error = %error, "failed to record queue depth");
    }

    Ok(Json(summary.into()))
}
