use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct APIError {
    pub cause: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseType<T = String> {
    pub data: Option<T>,
    pub error: Option<APIError>,
}
