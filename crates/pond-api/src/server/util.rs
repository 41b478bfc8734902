/// The fronting auth proxy resolves the caller's farm membership and places
/// the resulting role in this header; the engine never sees credentials.
fn require_role(headers: &HeaderMap) -> Result<Role, HttpApiError> {
    let Some(value) = headers.get(ROLE_HEADER) else {
        return Err(HttpApiError::unauthenticated(
            "missing x-role header",
            None,
        ));
    };

    let raw = value.to_str().map_err(|_| {
        HttpApiError::unauthenticated("x-role header is not valid ascii", None)
    })?;

    Role::parse(raw).ok_or_else(|| {
        HttpApiError::unauthenticated(
            "unrecognized role",
            Some(format!("x-role={raw}")),
        )
    })
}

fn paginate(
    total: usize,
    cursor: Option<usize>,
    page_size: Option<usize>,
) -> Result<(usize, usize, Option<usize>), HttpApiError> {
    let start = cursor.unwrap_or(0);
    if start > total {
        return Err(HttpApiError::invalid_input(
            "cursor is out of bounds",
            Some(format!("cursor={start} total={total}")),
        ));
    }

    let size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .max(1)
        .min(MAX_PAGE_SIZE);
    let end = start.saturating_add(size).min(total);
    let next_cursor = if end < total { Some(end) } else { None };

    Ok((start, end, next_cursor))
}

fn recorded_at_or_now(recorded_at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    recorded_at.unwrap_or_else(Utc::now)
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}
