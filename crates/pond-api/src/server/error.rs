#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn invalid_input(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidInput, message, details),
        }
    }

    fn unauthenticated(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: ApiError::new(ErrorCode::Unauthenticated, message, details),
        }
    }

    fn forbidden(role: Role) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: ApiError::new(
                ErrorCode::Forbidden,
                "role may not invoke mutating operations",
                Some(format!("role={}", role.as_str())),
            ),
        }
    }

    fn pond_not_found(pond_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new(
                ErrorCode::PondNotFound,
                "pond_id does not match a known pond",
                Some(format!("pond_id={pond_id}")),
            ),
        }
    }

    fn conflict(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            error: ApiError::new(ErrorCode::InvariantViolation, message, details),
        }
    }

    fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(ErrorCode::InternalError, message, details),
        }
    }

    fn from_api(err: EngineApiError) -> Self {
        match err {
            EngineApiError::Forbidden { role } => Self::forbidden(role),
            EngineApiError::Engine(engine_err) => Self::from_engine(engine_err),
        }
    }

    fn from_engine(err: EngineError) -> Self {
        match &err {
            EngineError::PondNotFound(pond_id) => Self::pond_not_found(pond_id),
            EngineError::InvalidGeometry { .. }
            | EngineError::GeometryIncomplete
            | EngineError::ZeroDelta
            | EngineError::InvalidSampling(_)
            | EngineError::NonPositiveHarvestField { .. }
            | EngineError::InvalidGrowthRate(_) => Self::invalid_input(err.to_string(), None),
            EngineError::PopulationWouldGoNegative { .. }
            | EngineError::OverHarvestCount { .. }
            | EngineError::OverHarvestBiomass { .. } => Self::conflict(err.to_string(), None),
            EngineError::SaleHandoffFailed(_) | EngineError::Storage(_) => {
                Self::internal("operation failed", Some(err.to_string()))
            }
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
