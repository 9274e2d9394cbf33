//! Weather Lookup Tool
//!
//! Fetches a one-line condition + temperature report from wttr.in.

use async_trait::async_trait;
use reqwest::StatusCode;

use agent_core::{Tool, ToolSchema};

use crate::BuiltinTool;
use crate::error::ToolError;

pub const DEFAULT_WEATHER_URL: &str = "https://wttr.in";

/// Returned for any failure, whatever its cause
pub const WEATHER_FAILURE: &str = "Something went wrong";

pub struct WeatherTool {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherTool {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The city goes into the path as given; `%C+%t` asks for condition and temperature.
    fn url(&self, city: &str) -> String {
        format!("{}/{}?format=%C+%t", self.base_url, city)
    }

    async fn fetch(&self, city: &str) -> Result<String, ToolError> {
        let response = self.client.get(self.url(city)).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ToolError::Status(status));
        }

        let body = response.text().await?;
        Ok(format!("The weather in {city} is {body}."))
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new(DEFAULT_WEATHER_URL)
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: BuiltinTool::GetWeather.name().into(),
            description: "returns weather info.".into(),
            argument: "city".into(),
            has_side_effects: false,
        }
    }

    async fn invoke(&self, input: &str) -> String {
        match self.fetch(input).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(city = %input, "Weather lookup failed: {}", e);
                WEATHER_FAILURE.into()
            }
        }
    }
}
