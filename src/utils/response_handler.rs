//! Uniform JSON response envelope
//!
//! Every endpoint answers with the same `{success, message, data}` shape,
//! both on success and on failure, so clients never have to parse a bare
//! error body.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

/// Success/failure wrapper returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonData<T = serde_json::Value> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> JsonData<T> {
    /// Successful envelope carrying a payload
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Render with HTTP 200
    pub fn into_response(self) -> HttpResponse {
        self.into_response_with(StatusCode::OK)
    }

    pub fn into_response_with(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

impl JsonData {
    /// Failure envelope with no payload
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let envelope = JsonData::success(3, "添加成功");
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value, json!({"success": true, "message": "添加成功", "data": 3}));
    }

    #[test]
    fn test_fail_has_null_data() {
        let value = serde_json::to_value(JsonData::fail("删除失败")).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "删除失败");
        assert!(value["data"].is_null());
    }

    #[actix_web::test]
    async fn test_into_response_status() {
        let resp = JsonData::fail("token无效，请重新登录").into_response_with(StatusCode::UNAUTHORIZED);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = JsonData::success("ok", "fine").into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
