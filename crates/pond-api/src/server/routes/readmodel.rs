#[derive(Debug, Serialize)]
struct ClassificationResponse {
    schema_version: String,
    pond_id: String,
    classification: Classification,
}

async fn get_classification(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ClassificationResponse>, HttpApiError> {
    require_role(&headers)?;

    let classification = state
        .api
        .classification(&pond_id)
        .map_err(HttpApiError::from_api)?;

    Ok(Json(ClassificationResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        pond_id,
        classification,
    }))
}

#[derive(Debug, Deserialize)]
struct ProjectionQuery {
    growth_rate_g_per_day: Option<f64>,
    target_weight_g: Option<f64>,
    price_per_kg: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ProjectionResponse {
    schema_version: String,
    pond_id: String,
    projection: GrowthProjection,
}

async fn get_projection(
    Path(pond_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<ProjectionResponse>, HttpApiError> {
    require_role(&headers)?;

    let Some(price_per_kg) = query.price_per_kg else {
        return Err(HttpApiError::invalid_input(
            "price_per_kg query parameter is required",
            None,
        ));
    };

    let projection = state
        .api
        .projection(
            &pond_id,
            query.growth_rate_g_per_day,
            query.target_weight_g,
            price_per_kg,
            Utc::now().date_naive(),
        )
        .map_err(HttpApiError::from_api)?;

    Ok(Json(ProjectionResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        pond_id,
        projection,
    }))
}
