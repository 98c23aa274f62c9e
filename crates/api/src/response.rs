//! Shared response envelope types for API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope, used where a handler relays
/// an engine response body.
///
/// ```ignore
/// Ok(Json(DataResponse { data: engine_response }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
