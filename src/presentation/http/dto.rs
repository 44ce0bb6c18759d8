use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AskRequestDto {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponseDto {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ToolDto {
    pub name: &'static str,
    pub description: &'static str,
}
