//! HTTP-shaped entry points: query parameters in, a status code and JSON
//! body out. Framework-agnostic so any web layer can mount them.

use crate::bucket::TimeRange;
use crate::error::DashboardError;
use crate::schema::{ChartDataRequest, ChartType};
use crate::service::MockDataService;
use log::debug;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Status code and JSON body, ready for any web layer to send.
pub type ApiReply = (u16, Value);

/// `GET /api/charts` equivalent. Both `timeRange` and `chartType` are
/// required; unknown values for either are validation errors.
pub async fn handle_charts_request(
    service: &MockDataService,
    params: &HashMap<String, String>,
) -> ApiReply {
    let (Some(raw_range), Some(raw_type)) = (params.get("timeRange"), params.get("chartType"))
    else {
        return (
            400,
            json!({
                "success": false,
                "error": {
                    "code": "MISSING_PARAMETERS",
                    "message": "timeRange and chartType parameters are required"
                }
            }),
        );
    };

    let time_range = match raw_range.parse::<TimeRange>() {
        Ok(range) => range,
        Err(err) => return error_reply(&err),
    };
    let chart_type = match raw_type.parse::<ChartType>() {
        Ok(chart_type) => chart_type,
        Err(err) => return error_reply(&err),
    };

    match service
        .get_chart_data(&ChartDataRequest::new(time_range, chart_type))
        .await
    {
        Ok(response) => (200, body(&response)),
        Err(err) => error_reply(&err),
    }
}

/// `GET /api/charts/cash-flow` equivalent. `timeRange` is required, but an
/// unknown range value degrades to the 30D default instead of failing.
pub async fn handle_cash_flow_request(
    service: &MockDataService,
    params: &HashMap<String, String>,
) -> ApiReply {
    let Some(raw_range) = params.get("timeRange") else {
        let err = DashboardError::MissingParameter("timeRange".to_string());
        return error_reply(&err);
    };

    let time_range = raw_range.parse::<TimeRange>().unwrap_or_else(|_| {
        debug!("Unknown time range {:?}, using the 30D default", raw_range);
        TimeRange::ThirtyDays
    });

    match service.get_cash_flow_data(time_range).await {
        Ok(response) => (200, body(&response)),
        Err(err) => error_reply(&err),
    }
}

fn error_reply(err: &DashboardError) -> ApiReply {
    (err.status_code(), body(&MockDataService::error_envelope(err)))
}

fn body<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        json!({
            "success": false,
            "error": { "code": "INTERNAL_ERROR", "message": err.to_string() }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{GeneratorConfig, SeriesGenerator};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn service() -> MockDataService {
        let config = GeneratorConfig {
            today: Some(NaiveDate::from_ymd_opt(2024, 6, 19).unwrap()),
            ..GeneratorConfig::default()
        };
        MockDataService::with_generator(SeriesGenerator::new(config).unwrap())
            .with_delay(Duration::ZERO)
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_charts_request_success() {
        let service = service();
        let (status, value) = handle_charts_request(
            &service,
            &params(&[("timeRange", "7D"), ("chartType", "profit")]),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(value["success"], true);
        assert_eq!(value["data"].as_array().unwrap().len(), 7);
        assert_eq!(value["metadata"]["dataPoints"], 7);
        assert_eq!(value["metadata"]["timeRange"], "7D");
    }

    #[tokio::test]
    async fn test_charts_request_missing_parameters() {
        let service = service();

        for query in [
            params(&[]),
            params(&[("timeRange", "7D")]),
            params(&[("chartType", "profit")]),
        ] {
            let (status, value) = handle_charts_request(&service, &query).await;
            assert_eq!(status, 400);
            assert_eq!(value["success"], false);
            assert_eq!(value["error"]["code"], "MISSING_PARAMETERS");
        }
    }

    #[tokio::test]
    async fn test_charts_request_rejects_unknown_values() {
        let service = service();

        let (status, value) = handle_charts_request(
            &service,
            &params(&[("timeRange", "14D"), ("chartType", "profit")]),
        )
        .await;
        assert_eq!(status, 500);
        assert_eq!(value["error"]["code"], "VALIDATION_ERROR");

        let (status, value) = handle_charts_request(
            &service,
            &params(&[("timeRange", "7D"), ("chartType", "bogus")]),
        )
        .await;
        assert_eq!(status, 500);
        assert_eq!(value["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_cash_flow_request_success() {
        let service = service();
        let (status, value) =
            handle_cash_flow_request(&service, &params(&[("timeRange", "7D")])).await;

        assert_eq!(status, 200);
        assert_eq!(value["success"], true);
        assert_eq!(value["data"].as_array().unwrap().len(), 9);
        assert_eq!(value["metadata"]["timeRange"], "7D");
    }

    #[tokio::test]
    async fn test_cash_flow_request_missing_parameter() {
        let service = service();
        let (status, value) = handle_cash_flow_request(&service, &params(&[])).await;

        assert_eq!(status, 400);
        assert_eq!(value["error"]["code"], "MISSING_PARAMETER");
        assert_eq!(
            value["error"]["message"],
            "Missing required parameter: timeRange"
        );
    }

    #[tokio::test]
    async fn test_cash_flow_request_unknown_range_defaults_to_thirty_days() {
        let service = service();
        let (status, value) =
            handle_cash_flow_request(&service, &params(&[("timeRange", "14D")])).await;

        assert_eq!(status, 200);
        assert_eq!(value["metadata"]["timeRange"], "30D");
        assert_eq!(value["data"].as_array().unwrap().len(), 33);
    }
}
