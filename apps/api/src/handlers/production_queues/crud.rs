use super::*;

pub async fn list_queues_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    params: QueryParams,
) -> ApiResult<Json<ProductionQueueListResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = queue_service(&state)?;

    let statuses = params
        .all(&["status"])
        .iter()
        .map(|raw| ProductionQueueStatus::from_str(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| ApiError::bad_request("invalid_status", error_detail(&error)))?;
    let priorities = params
        .all(&["priority"])
        .iter()
        .map(|raw| ProductionQueuePriority::from_str(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| ApiError::bad_request("invalid_priority", error_detail(&error)))?;
    let page_size = parse_page_size(params.first(&["page_size", "pageSize"]))?;

    let page = service
        .list_queues(ProductionQueueFilter {
            statuses,
            priorities,
            page: PageRequest::new(page_size, params.first(&["page_token", "pageToken"])),
        })
        .await
        .map_err(map_queue_error)?;

    Ok(Json(ProductionQueueListResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        next_page_token: page.next_page_token,
    }))
}

pub async fn get_queue_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(queue_id): Path<String>,
) -> ApiResult<Json<ProductionQueueResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let queue = queue_service(&state)?
        .get_queue(&queue_id)
        .await
        .map_err(map_queue_error)?;
    Ok(Json(queue.into()))
}

pub async fn create_queue_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Body,
) -> ApiResult<(StatusCode, Json<ProductionQueueResponse>)> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = queue_service(&state)?;

    let bytes = read_required_body(body, QUEUE_BODY_LIMIT).await?;
    let request: ProductionQueueRequest = decode_json(&bytes, "invalid_queue")?;
    let queue = service
        .create_queue(request.into())
        .await
        .map_err(map_queue_error)?;

    let mut record = queue_audit(&identity, "production_queue.create", &queue.id);
    record.metadata = snapshot(&queue);
    record_audit(&state, record).await;

    tracing::info!(queue_id = %queue.id, "production queue created");
    Ok((StatusCode::CREATED, Json(queue.into())))
}

pub async fn update_queue_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(queue_id): Path<String>,
    body: Body,
) -> ApiResult<Json<ProductionQueueResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = queue_service(&state)?;

    let bytes = read_required_body(body, QUEUE_BODY_LIMIT).await?;
    let request: ProductionQueueRequest = decode_json(&bytes, "invalid_queue")?;
    let previous = service.get_queue(&queue_id).await.map_err(map_queue_error)?;
    let queue = service
        .update_queue(&queue_id, request.into())
        .await
        .map_err(map_queue_error)?;

    let mut record = queue_audit(&identity, "production_queue.update", &queue.id);
    record.diff = config_diff(&previous, &queue);
    record_audit(&state, record).await;

    Ok(Json(queue.into()))
}

pub async fn delete_queue_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(queue_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let queue = queue_service(&state)?
        .delete_queue(&queue_id)
        .await
        .map_err(map_queue_error)?;

    let mut record = queue_audit(&identity, "production_queue.delete", &queue.id);
    record.metadata = snapshot(&queue);
    record_audit(&state, record).await;

    tracing::info!(queue_id = %queue.id, "production queue deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn snapshot(queue: &ProductionQueue) -> serde_json::Map<String, serde_json::Value> {
    let mut metadata = serde_json::Map::new();
    metadata.insert("name".to_owned(), json!(queue.name));
    metadata.insert("capacity".to_owned(), json!(queue.capacity));
    metadata.insert("priority".to_owned(), json!(queue.priority.as_str()));
    metadata.insert("status".to_owned(), json!(queue.status.as_str()));
    metadata.insert("workCenters".to_owned(), json!(queue.work_centers));
    metadata
}

fn config_diff(
    previous: &ProductionQueue,
    current: &ProductionQueue,
) -> sealworks_domain::AuditDiff {
    let before = snapshot(previous);
    let after = snapshot(current);
    after
        .into_iter()
        .filter(|(key, value)| before.get(key) != Some(value))
        .map(|(key, value)| {
            let old = before.get(&key).cloned().unwrap_or_default();
            (key, AuditDiffValue::new(old, value))
        })
        .collect()
}
