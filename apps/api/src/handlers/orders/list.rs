use super::*;

pub async fn list_orders_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    params: QueryParams,
) -> ApiResult<Json<OrderListResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = state.order_service.as_ref().ok_or_else(|| {
        ApiError::unavailable("order_service_unavailable", "order service unavailable")
    })?;

    let filter = build_filter(&params)?;
    let page = service.list_orders(filter).await.map_err(|error| match error {
        AppError::Validation(_) => ApiError::invalid_request(error_detail(&error)),
        other => {
            tracing::error!(error = %other, "failed to list orders");
            ApiError::internal("order_list_failed", "failed to list orders")
        }
    })?;

    Ok(Json(OrderListResponse {
        items: page.items.into_iter().map(OrderSummaryResponse::from).collect(),
        next_page_token: page.next_page_token,
    }))
}

pub async fn get_order_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<OrderSummaryResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = state.order_service.as_ref().ok_or_else(|| {
        ApiError::unavailable("order_service_unavailable", "order service unavailable")
    })?;

    let order = service
        .get_order(required_order_id(&order_id)?)
        .await
        .map_err(|error| match error {
            AppError::NotFound(_) => ApiError::not_found("order_not_found", error_detail(&error)),
            other => ApiError::from(other),
        })?;
    Ok(Json(order.into()))
}

fn build_filter(params: &QueryParams) -> ApiResult<OrderFilter> {
    let statuses = params
        .all(&["status"])
        .iter()
        .map(|raw| OrderStatus::from_str(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| ApiError::bad_request("invalid_status", error_detail(&error)))?;

    let created_after = optional_timestamp(
        params.first(&["created_after", "since"]).as_deref(),
        "invalid_created_after",
        "created_after",
    )?;
    let created_before = optional_timestamp(
        params.first(&["created_before", "until"]).as_deref(),
        "invalid_created_before",
        "created_before",
    )?;
    if let (Some(after), Some(before)) = (created_after, created_before)
        && after > before
    {
        return Err(ApiError::bad_request(
            "invalid_range",
            "created_after must not be after created_before",
        ));
    }

    let sort = params
        .first(&["sort"])
        .map(|raw| OrderSortField::from_str(&raw))
        .transpose()
        .map_err(|error| ApiError::bad_request("invalid_sort", error_detail(&error)))?
        .unwrap_or_default();
    let direction = params
        .first(&["order"])
        .map(|raw| SortDirection::from_str(&raw))
        .transpose()
        .map_err(|error| ApiError::bad_request("invalid_order", error_detail(&error)))?
        .unwrap_or_default();
    let page_size = parse_page_size(params.first(&["page_size", "pageSize"]))?;

    Ok(OrderFilter {
        statuses,
        payment_statuses: params.all(&["payment_status"]),
        production_queue: params.first(&["queue", "production_queue"]),
        channel: params.first(&["channel"]),
        customer_email: params.first(&["customer_email"]),
        promotion_code: params.first(&["promotion_code"]),
        created_after,
        created_before,
        sort,
        direction,
        page: PageRequest::new(page_size, params.first(&["page_token", "pageToken"])),
    })
}
