//! Search request parsing.

use serde_json::Value;

use rx_search_core::models::{ClinicalContext, SearchContext};

use crate::error::{GatewayError, GatewayResult};

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchRequest {
    pub text: String,
    pub context: Option<ClinicalContext>,
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON request body.
    ///
    /// `text` must be a string (it may be empty). `limit`, when present, must
    /// be a non-negative integer. `context` is read leniently: malformed
    /// fields are dropped and a non-object context is ignored.
    pub fn from_json(body: &str) -> GatewayResult<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| GatewayError::BadRequest(format!("malformed JSON ({e})")))?;

        let object = value
            .as_object()
            .ok_or_else(|| GatewayError::BadRequest("body must be a JSON object".into()))?;

        let text = match object.get("text") {
            Some(Value::String(text)) => text.clone(),
            Some(_) => return Err(GatewayError::BadRequest("'text' must be a string".into())),
            None => return Err(GatewayError::BadRequest("missing 'text'".into())),
        };

        let limit = match object.get("limit") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                raw.as_u64()
                    .and_then(|l| usize::try_from(l).ok())
                    .ok_or_else(|| {
                        GatewayError::BadRequest("'limit' must be a non-negative integer".into())
                    })?,
            ),
        };

        let context = object
            .get("context")
            .and_then(ClinicalContext::from_json_value)
            .filter(|ctx| !ctx.is_empty());

        Ok(Self {
            text,
            context,
            limit,
        })
    }

    pub fn to_search_context(&self) -> SearchContext {
        SearchContext {
            query: self.text.clone(),
            clinical_context: self.context.clone(),
            limit: self.limit,
        }
    }
}
