use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::api::handlers::{
    export::{export_filtered, generate_report, get_export_controls},
    graph::get_graph,
    packets::{
        download_capture, get_dashboard, get_packets, get_raw_capture, get_summary, list_captures,
    },
};

/// Root endpoint to provide information about the API
async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "sharkview API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": [
            {
                "path": "/api/captures",
                "method": "GET",
                "description": "List loaded captures"
            },
            {
                "path": "/api/captures/{id}/summary",
                "method": "GET",
                "description": "Packet, byte, protocol, address and port totals"
            },
            {
                "path": "/api/captures/{id}/packets",
                "method": "GET",
                "description": "Filtered packet table (srcMac, dstMac, srcIp, dstIp, protocol, port, lengthMin, lengthMax, timeStart, timeEnd, q, offset, limit)"
            },
            {
                "path": "/api/captures/{id}/graph/{hosts|macs|protocols}",
                "method": "GET",
                "description": "Communication graph over the filtered packets (weight=packets|bytes)"
            },
            {
                "path": "/api/captures/{id}/dashboard",
                "method": "GET",
                "description": "Pre-aggregated dashboard panels"
            },
            {
                "path": "/api/captures/{id}/export/{report|csv}",
                "method": "POST",
                "description": "Filtered report or CSV export through the report service"
            },
            {
                "path": "/api/captures/{id}/report",
                "method": "POST",
                "description": "Report built from the selected sections, returned as rendered by the report service"
            },
            {
                "path": "/api/captures/{id}/raw",
                "method": "GET",
                "description": "The capture document as loaded from disk"
            },
            {
                "path": "/api/captures/{id}/download",
                "method": "GET",
                "description": "The capture document as a file attachment"
            },
            {
                "path": "/api/exports",
                "method": "GET",
                "description": "State of the export controls"
            }
        ]
    }))
}

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Root endpoint
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                .route("/exports", web::get().to(get_export_controls))
                .service(
                    web::scope("/captures")
                        .route("", web::get().to(list_captures))
                        .route("/{id}/summary", web::get().to(get_summary))
                        .route("/{id}/packets", web::get().to(get_packets))
                        .route("/{id}/dashboard", web::get().to(get_dashboard))
                        .route("/{id}/raw", web::get().to(get_raw_capture))
                        .route("/{id}/download", web::get().to(download_capture))
                        .route("/{id}/graph/{kind}", web::get().to(get_graph))
                        .route("/{id}/export/{kind}", web::post().to(export_filtered))
                        .route("/{id}/report", web::post().to(generate_report)),
                ),
        );
}
