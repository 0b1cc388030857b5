use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use trendlens_engine::EngineError;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Tool {
    TrackTrend,
    AnalyzeTrend,
    CompareTrends,
    GetTrendingTopics,
    SentimentBreakdown,
}

impl Tool {
    pub(super) const ALL: [Tool; 5] = [
        Tool::TrackTrend,
        Tool::AnalyzeTrend,
        Tool::CompareTrends,
        Tool::GetTrendingTopics,
        Tool::SentimentBreakdown,
    ];

    pub(super) fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub(super) fn name(self) -> &'static str {
        match self {
            Tool::TrackTrend => "track_trend",
            Tool::AnalyzeTrend => "analyze_trend",
            Tool::CompareTrends => "compare_trends",
            Tool::GetTrendingTopics => "get_trending_topics",
            Tool::SentimentBreakdown => "sentiment_breakdown",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Tool::TrackTrend => {
                "Mention volume, overall sentiment and top sources for a keyword"
            }
            Tool::AnalyzeTrend => {
                "Full trend metrics for a keyword: per-platform counts, sentiment \
                 distribution, direction and sample mentions"
            }
            Tool::CompareTrends => "Side-by-side trend metrics for several keywords",
            Tool::GetTrendingTopics => {
                "Hashtags and recurring phrases surfacing in recent content"
            }
            Tool::SentimentBreakdown => {
                "Sentiment detail for a keyword restricted to social, web or both"
            }
        }
    }

    fn input_schema(self) -> Value {
        let timeframe = json!({
            "type": "string",
            "description": "Window such as 1h, 24h, 7d; defaults to the configured timeframe"
        });
        match self {
            Tool::TrackTrend | Tool::AnalyzeTrend => json!({
                "type": "object",
                "properties": {
                    "keyword": { "type": "string" },
                    "timeframe": timeframe,
                },
                "required": ["keyword"]
            }),
            Tool::CompareTrends => json!({
                "type": "object",
                "properties": {
                    "keywords": { "type": "array", "items": { "type": "string" } },
                    "timeframe": timeframe,
                },
                "required": ["keywords"]
            }),
            Tool::GetTrendingTopics => json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "tech, finance or general"
                    },
                    "limit": { "type": "integer", "minimum": 1, "maximum": 50, "default": 10 }
                }
            }),
            Tool::SentimentBreakdown => json!({
                "type": "object",
                "properties": {
                    "keyword": { "type": "string" },
                    "source_type": {
                        "type": "string",
                        "enum": ["social", "twitter", "web", "both"],
                        "default": "both"
                    }
                },
                "required": ["keyword"]
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct KeywordInput {
    keyword: String,
    timeframe: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompareInput {
    keywords: Vec<String>,
    timeframe: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TopicsInput {
    category: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct BreakdownInput {
    keyword: String,
    source_type: Option<String>,
}

pub(super) async fn list_tools(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<ToolDescriptor>>> {
    let data = Tool::ALL
        .into_iter()
        .map(|tool| ToolDescriptor {
            name: tool.name(),
            description: tool.description(),
            input_schema: tool.input_schema(),
        })
        .collect();
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn call_tool(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(tool_name): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let request_id = req_id.0;
    let Some(tool) = Tool::from_name(&tool_name) else {
        return Err(ApiError::new(
            request_id,
            "not_found",
            format!("unknown tool '{tool_name}'"),
        ));
    };

    tracing::info!(tool = tool.name(), request_id = %request_id, "tool call");
    let engine = &state.engine;
    let result = match tool {
        Tool::TrackTrend => {
            let input: KeywordInput = parse_input(&request_id, &body)?;
            to_value(engine.track_trend(&input.keyword, input.timeframe.as_deref()).await)
        }
        Tool::AnalyzeTrend => {
            let input: KeywordInput = parse_input(&request_id, &body)?;
            to_value(engine.analyze_trend(&input.keyword, input.timeframe.as_deref()).await)
        }
        Tool::CompareTrends => {
            let input: CompareInput = parse_input(&request_id, &body)?;
            to_value(
                engine
                    .compare_trends(&input.keywords, input.timeframe.as_deref())
                    .await,
            )
        }
        Tool::GetTrendingTopics => {
            let input: TopicsInput = if body.iter().all(u8::is_ascii_whitespace) {
                TopicsInput::default()
            } else {
                parse_input(&request_id, &body)?
            };
            to_value(
                engine
                    .get_trending_topics(input.category.as_deref(), input.limit)
                    .await,
            )
        }
        Tool::SentimentBreakdown => {
            let input: BreakdownInput = parse_input(&request_id, &body)?;
            to_value(
                engine
                    .sentiment_breakdown(&input.keyword, input.source_type.as_deref())
                    .await,
            )
        }
    };

    match result {
        Ok(data) => Ok(Json(ApiResponse {
            data,
            meta: ResponseMeta::new(request_id),
        })),
        Err(err) => Err(map_tool_error(request_id, tool, &err)),
    }
}

fn parse_input<T: DeserializeOwned>(request_id: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("invalid tool input: {e}"),
        )
    })
}

fn to_value<T: Serialize>(result: Result<T, EngineError>) -> Result<Value, EngineError> {
    result.and_then(|v| {
        serde_json::to_value(v).map_err(|e| EngineError::Internal(format!("serialize result: {e}")))
    })
}

fn map_tool_error(request_id: String, tool: Tool, error: &EngineError) -> ApiError {
    match error {
        EngineError::InvalidInput(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        EngineError::Internal(_) => {
            tracing::error!(tool = tool.name(), error = %error, "tool call failed");
            ApiError::new(request_id, "internal_error", "tool call failed")
        }
    }
}
