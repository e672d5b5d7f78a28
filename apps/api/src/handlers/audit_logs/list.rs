use super::csv_export::csv_response;
use super::*;

pub async fn list_audit_logs_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    params: QueryParams,
) -> ApiResult<Response> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = state.audit_log_service.as_ref().ok_or_else(|| {
        ApiError::unavailable("service_unavailable", "audit log service unavailable")
    })?;

    let filter = build_filter(&params)?;
    let target_ref = filter.target_ref.clone();
    let page = service.list(filter).await.map_err(|error| match error {
        AppError::Validation(detail) => ApiError::invalid_request(detail),
        other => {
            tracing::error!(target_ref = %target_ref, error = %other, "failed to list audit logs");
            ApiError::internal("audit_logs_unavailable", "failed to load audit logs")
        }
    })?;

    let full_access = identity.has_role(Role::Admin);
    let items: Vec<AuditLogEntryResponse> = page
        .items
        .into_iter()
        .map(|entry| {
            if full_access {
                AuditLogEntryResponse::full(entry)
            } else {
                AuditLogEntryResponse::redacted(entry)
            }
        })
        .collect();

    let wants_csv = params
        .first(&["format"])
        .is_some_and(|format| format.eq_ignore_ascii_case("csv"));
    if wants_csv {
        return csv_response(&target_ref, &items, page.next_page_token.as_deref());
    }

    Ok(Json(AuditLogListResponse {
        items,
        next_page_token: page.next_page_token,
    })
    .into_response())
}

fn build_filter(params: &QueryParams) -> ApiResult<AuditLogFilter> {
    let target_ref = params
        .first(&["targetRef", "target_ref"])
        .ok_or_else(|| ApiError::invalid_request("targetRef is required"))?;

    let page_size = parse_page_size(params.first(&["pageSize", "page_size"]))?;
    let created_after = optional_timestamp(
        params
            .first(&["from", "created_after", "start"])
            .as_deref(),
        "invalid_from",
        "from",
    )?;
    let created_before = optional_timestamp(
        params.first(&["to", "created_before", "end"]).as_deref(),
        "invalid_to",
        "to",
    )?;
    if let (Some(from), Some(to)) = (created_after, created_before)
        && from > to
    {
        return Err(ApiError::bad_request(
            "invalid_range",
            "from must not be after to",
        ));
    }

    Ok(AuditLogFilter {
        target_ref,
        actor: params.first(&["actor", "actor_ref"]),
        actor_type: params.first(&["actorType", "actor_type"]),
        action: params.first(&["action"]),
        created_after,
        created_before,
        page: PageRequest::new(page_size, params.first(&["pageToken", "page_token"])),
    })
}
