#[derive(Debug, Deserialize)]
struct CreatePondRequest {
    farm_id: String,
    name: String,
    geometry: Option<PondGeometry>,
}

#[derive(Debug, Serialize)]
struct PondResponse {
    schema_version: String,
    pond: PondRecord,
}

impl PondResponse {
    fn new(pond: PondRecord) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            pond,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListPondsQuery {
    farm_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListPondsResponse {
    schema_version: String,
    ponds: Vec<PondRecord>,
}

async fn create_pond(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreatePondRequest>,
) -> Result<Json<PondResponse>, HttpApiError> {
    let role = require_role(&headers)?;

    if request.farm_id.trim().is_empty() {
        return Err(HttpApiError::invalid_input("farm_id is required", None));
    }
    if request.name.trim().is_empty() {
        return Err(HttpApiError::invalid_input("name is required", None));
    }

    let pond = state
        .api
        .create_pond(role, &request.farm_id, &request.name, request.geometry)
        .map_err(HttpApiError::from_api)?;

    Ok(Json(PondResponse::new(pond)))
}

async fn list_ponds(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListPondsQuery>,
) -> Result<Json<ListPondsResponse>, HttpApiError> {
    require_role(&headers)?;

    let ponds = state.api.list_ponds(query.farm_id.as_deref());
    Ok(Json(ListPondsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        ponds,
    }))
}

async fn get_pond(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PondResponse>, HttpApiError> {
    require_role(&headers)?;

    let pond = state.api.get_pond(&pond_id).map_err(HttpApiError::from_api)?;
    Ok(Json(PondResponse::new(pond)))
}

async fn update_pond(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<PondUpdate>,
) -> Result<Json<PondResponse>, HttpApiError> {
    let role = require_role(&headers)?;

    let pond = state
        .api
        .update_pond(role, &pond_id, &update)
        .map_err(HttpApiError::from_api)?;
    Ok(Json(PondResponse::new(pond)))
}
