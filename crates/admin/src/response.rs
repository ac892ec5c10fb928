//! JSON envelopes returned to the table widget.

use crate::error::AdminError;
use serde::Serialize;

/// `{code, msg, data?}`; `code` 0 means success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn ok(msg: &str) -> Self {
        Self {
            code: 0,
            msg: msg.to_string(),
            data: None,
        }
    }

    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            code: 0,
            msg: String::new(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

impl From<&AdminError> for ApiResponse {
    fn from(err: &AdminError) -> Self {
        ApiResponse::error(err.code(), err.to_string())
    }
}

/// One page of list data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResponse {
    pub code: i32,
    pub msg: String,
    pub count: u64,
    pub num_pages: u64,
    pub page_size: u64,
    pub page: u64,
    pub data: Vec<serde_json::Value>,
}

impl ListResponse {
    pub fn new(count: u64, page: u64, page_size: u64, data: Vec<serde_json::Value>) -> Self {
        Self {
            code: 0,
            msg: String::new(),
            count,
            num_pages: num_pages(count, page_size),
            page_size,
            page,
            data,
        }
    }
}

/// `ceil(count / page_size)`, or 0 when pages have no size.
pub fn num_pages(count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}
