use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Answer every `/control` and `/exists` request with 200, as older
    /// remote clients expect. When false, missing parameters get 400 and
    /// unknown codes get 404.
    pub legacy_status_codes: bool,
}
