use serde::{Deserialize, Serialize};

/// Query string of `GET /autocomplete`
#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    /// Text typed so far; may be empty
    pub query: String,
}

/// Response for `GET /autocomplete`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AutocompleteResponse {
    /// At most five phrases, shortest first
    pub suggestions: Vec<String>,
}
