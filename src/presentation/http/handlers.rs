use axum::{Json, extract::State};
use std::sync::Arc;

use crate::application::services::AgentDispatcher;
use crate::domain::entities::RouteState;
use crate::presentation::http::dto::{AskRequestDto, AskResponseDto, ToolDto};
use crate::presentation::http::errors::AppError;

pub struct AskHandler {
    dispatcher: Arc<AgentDispatcher>,
}

impl AskHandler {
    pub fn new(dispatcher: Arc<AgentDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn ask(
        State(handler): State<Arc<AskHandler>>,
        Json(body): Json<AskRequestDto>,
    ) -> Result<Json<AskResponseDto>, AppError> {
        let message = body.message.trim();
        if message.is_empty() {
            return Err(AppError::BadRequest("Message cannot be empty".to_string()));
        }

        let outcome = handler.dispatcher.dispatch(message).await;

        match outcome.state {
            RouteState::Answered => Ok(Json(AskResponseDto {
                response: outcome.payload.unwrap_or_default(),
            })),
            _ => Err(AppError::DispatchFailed(
                outcome
                    .error
                    .unwrap_or_else(|| "dispatch failed".to_string()),
            )),
        }
    }

    pub async fn list_tools(State(handler): State<Arc<AskHandler>>) -> Json<Vec<ToolDto>> {
        let tools = handler
            .dispatcher
            .registry()
            .descriptions()
            .into_iter()
            .map(|(name, description)| ToolDto { name, description })
            .collect();

        Json(tools)
    }
}
