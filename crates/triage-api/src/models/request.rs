use serde::Deserialize;

/// Log upload: the file name drives format detection unless `format` is given
#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub filename: String,
    pub content: String,
    pub format: Option<String>,
}
