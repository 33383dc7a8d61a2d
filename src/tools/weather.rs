//! Current-weather tool backed by the open-meteo forecast endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use super::{build_definition, ParamKind, ParamSpec, ToolError, ToolHandler, ToolSet};

const DOC: &str = "Get current weather for a location.\n\n\
Args:\n\
    latitude: Latitude of the location\n\
    longitude: Longitude of the location\n\n\
Returns:\n\
    Weather data, or an error description\n";

pub fn register(tools: &mut ToolSet, http: reqwest::Client, base_url: String) {
    let definition = build_definition(
        "get_current_weather",
        DOC,
        &[
            ParamSpec::required("latitude", ParamKind::Number),
            ParamSpec::required("longitude", ParamKind::Number),
        ],
    );
    tools.register(definition, Arc::new(WeatherTool { http, base_url }));
}

struct WeatherTool {
    http: reqwest::Client,
    base_url: String,
}

pub(crate) fn forecast_url(base_url: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "{}/v1/forecast?latitude={}&longitude={}&current=temperature_2m&hourly=temperature_2m&daily=sunrise,sunset&timezone=auto",
        base_url.trim_end_matches('/'),
        latitude,
        longitude
    )
}

fn number_arg(args: &Map<String, Value>, name: &str) -> Result<f64, ToolError> {
    args.get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError(format!("missing or non-numeric argument: {name}")))
}

#[async_trait]
impl ToolHandler for WeatherTool {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let latitude = number_arg(&args, "latitude")?;
        let longitude = number_arg(&args, "longitude")?;
        let url = forecast_url(&self.base_url, latitude, longitude);

        let response = self.http.get(&url).send().await.map_err(|err| {
            warn!("weather request failed: {}", err);
            ToolError(format!("weather request failed: {err}"))
        })?;
        let response = response
            .error_for_status()
            .map_err(|err| ToolError(format!("weather request failed: {err}")))?;
        response
            .json::<Value>()
            .await
            .map_err(|err| ToolError(format!("invalid weather response: {err}")))
    }
}
