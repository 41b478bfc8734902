#[derive(Clone)]
struct AppState {
    api: std::sync::Arc<EngineApi>,
}

impl AppState {
    fn new(api: EngineApi) -> Self {
        Self {
            api: std::sync::Arc::new(api),
        }
    }
}
