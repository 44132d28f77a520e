use actix_web::{web, HttpResponse};
use std::collections::HashMap;

use crate::analysis::{FilterEngine, GraphAggregator};
use crate::api::handlers::packets::criteria_from_query;
use crate::api::AppState;
use crate::models::graph::{CommunicationEvent, EndpointKind, GraphOptions, WeightMode};
use crate::utils::error::{AppError, AppResult};

fn graph_variant(kind: &str) -> AppResult<(EndpointKind, GraphOptions)> {
    match kind {
        "hosts" => Ok((EndpointKind::Host, GraphOptions::hosts())),
        "macs" => Ok((EndpointKind::Mac, GraphOptions::macs())),
        "protocols" => Ok((EndpointKind::Mac, GraphOptions::protocol_aware())),
        other => Err(AppError::ValidationError(format!(
            "Unknown graph '{}', expected hosts, macs or protocols",
            other
        ))),
    }
}

fn weight_mode(params: &HashMap<String, String>) -> AppResult<WeightMode> {
    match params.get("weight").map(|w| w.trim()) {
        None | Some("") | Some("packets") => Ok(WeightMode::Packets),
        Some("bytes") => Ok(WeightMode::Bytes),
        Some(other) => Err(AppError::ValidationError(format!(
            "Unknown weight '{}', expected packets or bytes",
            other
        ))),
    }
}

/// Build a communication graph over the packets matching the filter
/// criteria in the query string
pub async fn get_graph(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<HashMap<String, String>>,
) -> AppResult<HttpResponse> {
    let (capture_id, kind) = path.into_inner();
    let params = query.into_inner();

    let (endpoints, options) = graph_variant(&kind)?;
    let mode = weight_mode(&params)?;
    let criteria = criteria_from_query(&params)?;
    let capture = state.store.get(&capture_id)?;

    let events: Vec<CommunicationEvent> = capture
        .packets
        .iter()
        .filter(|record| FilterEngine::matches(record, &criteria))
        .filter_map(|record| CommunicationEvent::from_record(record, endpoints, mode))
        .collect();

    Ok(HttpResponse::Ok().json(GraphAggregator::build(&events, &options)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants() {
        assert!(!graph_variant("hosts").unwrap().1.directed);
        assert!(graph_variant("protocols").unwrap().1.protocol_aware);
        assert!(matches!(graph_variant("ports"), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_weight_mode() {
        let mut params = HashMap::new();
        assert_eq!(weight_mode(&params).unwrap(), WeightMode::Packets);
        params.insert("weight".to_string(), "bytes".to_string());
        assert_eq!(weight_mode(&params).unwrap(), WeightMode::Bytes);
        params.insert("weight".to_string(), "frames".to_string());
        assert!(weight_mode(&params).is_err());
    }
}
