use utoipa::IntoParams;

/// Query string of `GET /receive`.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct SubscribeParams {
    /// Topic to subscribe to. Missing and empty are both rejected; when the key
    /// is repeated the first value wins.
    pub(crate) topic: Option<String>,
}

impl From<Vec<(String, String)>> for SubscribeParams {
    fn from(query: Vec<(String, String)>) -> Self {
        let topic = query
            .into_iter()
            .find(|(key, _)| key == "topic")
            .map(|(_, value)| value);
        Self { topic }
    }
}
