#[derive(Debug, Deserialize)]
struct PopulationDeltaRequest {
    delta: i64,
    reason: String,
    recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct PopulationEventResponse {
    schema_version: String,
    event: PopulationEvent,
}

#[derive(Debug, Deserialize)]
struct LedgerPageQuery {
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct PopulationLedgerResponse {
    schema_version: String,
    pond_id: String,
    events: Vec<PopulationEvent>,
    next_cursor: Option<usize>,
}

async fn append_population_delta(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PopulationDeltaRequest>,
) -> Result<Json<PopulationEventResponse>, HttpApiError> {
    let role = require_role(&headers)?;

    if request.reason.trim().is_empty() {
        return Err(HttpApiError::invalid_input("reason is required", None));
    }

    let event = state
        .api
        .apply_delta(
            role,
            &pond_id,
            request.delta,
            &request.reason,
            recorded_at_or_now(request.recorded_at),
        )
        .map_err(HttpApiError::from_api)?;

    Ok(Json(PopulationEventResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        event,
    }))
}

async fn list_population_events(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LedgerPageQuery>,
) -> Result<Json<PopulationLedgerResponse>, HttpApiError> {
    require_role(&headers)?;

    let events = state
        .api
        .population_events(&pond_id)
        .map_err(HttpApiError::from_api)?;
    let (start, end, next_cursor) = paginate(events.len(), query.cursor, query.page_size)?;

    Ok(Json(PopulationLedgerResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        pond_id,
        events: events[start..end].to_vec(),
        next_cursor,
    }))
}

/// Either field works: a direct fish-per-kg ratio, or an observed average
/// weight in grams which is converted on the way in.
#[derive(Debug, Deserialize)]
struct RecordSamplingRequest {
    fish_per_kg: Option<f64>,
    avg_weight_g: Option<f64>,
    note: Option<String>,
    recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct SamplingEventResponse {
    schema_version: String,
    event: SamplingEvent,
}

#[derive(Debug, Serialize)]
struct SamplingLedgerResponse {
    schema_version: String,
    pond_id: String,
    events: Vec<SamplingEvent>,
}

async fn record_sampling(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RecordSamplingRequest>,
) -> Result<Json<SamplingEventResponse>, HttpApiError> {
    let role = require_role(&headers)?;

    let fish_per_kg = match (request.fish_per_kg, request.avg_weight_g) {
        (Some(ratio), None) => ratio,
        (None, Some(grams)) => {
            if !(grams.is_finite() && grams > 0.0) {
                return Err(HttpApiError::invalid_input(
                    "avg_weight_g must be positive",
                    Some(format!("avg_weight_g={grams}")),
                ));
            }
            fish_per_kg_from_grams(grams)
        }
        (Some(_), Some(_)) => {
            return Err(HttpApiError::invalid_input(
                "supply either fish_per_kg or avg_weight_g, not both",
                None,
            ))
        }
        (None, None) => {
            return Err(HttpApiError::invalid_input(
                "fish_per_kg or avg_weight_g is required",
                None,
            ))
        }
    };

    let event = state
        .api
        .record_sampling(
            role,
            &pond_id,
            fish_per_kg,
            request.note,
            recorded_at_or_now(request.recorded_at),
        )
        .map_err(HttpApiError::from_api)?;

    Ok(Json(SamplingEventResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        event,
    }))
}

async fn list_sampling_events(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SamplingLedgerResponse>, HttpApiError> {
    require_role(&headers)?;

    let events = state
        .api
        .sampling_events(&pond_id)
        .map_err(HttpApiError::from_api)?;

    Ok(Json(SamplingLedgerResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        pond_id,
        events,
    }))
}

#[derive(Debug, Deserialize)]
struct RecordHarvestRequest {
    weight_kg: f64,
    count: i64,
    price_per_kg: f64,
    harvest_type: HarvestType,
    note: Option<String>,
    recorded_at: Option<DateTime<Utc>>,
    buyer_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct HarvestEventResponse {
    schema_version: String,
    event: HarvestEvent,
}

#[derive(Debug, Serialize)]
struct HarvestLedgerResponse {
    schema_version: String,
    pond_id: String,
    events: Vec<HarvestEvent>,
}

async fn record_harvest(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RecordHarvestRequest>,
) -> Result<Json<HarvestEventResponse>, HttpApiError> {
    let role = require_role(&headers)?;

    let harvest = HarvestRequest {
        weight_kg: request.weight_kg,
        count: request.count,
        price_per_kg: request.price_per_kg,
        harvest_type: request.harvest_type,
        note: request.note,
        recorded_at: recorded_at_or_now(request.recorded_at),
        buyer_id: request.buyer_id,
    };

    let event = state
        .api
        .record_harvest(role, &pond_id, &harvest)
        .map_err(HttpApiError::from_api)?;

    Ok(Json(HarvestEventResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        event,
    }))
}

async fn list_harvest_events(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HarvestLedgerResponse>, HttpApiError> {
    require_role(&headers)?;

    let events = state
        .api
        .harvest_events(&pond_id)
        .map_err(HttpApiError::from_api)?;

    Ok(Json(HarvestLedgerResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        pond_id,
        events,
    }))
}
