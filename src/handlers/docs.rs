//! Interactive API documentation.
//!
//! The OpenAPI document is built once; `/docs` and `/redoc` are static pages
//! that render it with Swagger UI and ReDoc.

use axum::response::{Html, Json};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

const TITLE: &str = "Unified File Extraction API";

static OPENAPI: Lazy<Value> = Lazy::new(|| {
    let block_ref = json!({ "$ref": "#/components/schemas/ContentBlock" });
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": TITLE,
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Extracts text and page images from base64-encoded PDF, DOCX, XLSX and image files. The file type is detected from content, never from the file name."
        },
        "paths": {
            "/process-file/": {
                "post": {
                    "summary": "Process a base64-encoded file",
                    "operationId": "process_file",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/ProcessFileRequest" }
                            }
                        }
                    },
                    "responses": {
                        "200": envelope_response("Unified document"),
                        "400": envelope_response("Invalid base64, empty file or malformed body"),
                        "408": envelope_response("Processing timed out"),
                        "413": envelope_response("Decoded file exceeds the size limit"),
                        "415": envelope_response("Unsupported file type"),
                        "422": envelope_response("The file could not be parsed"),
                        "503": envelope_response("A required external tool is unavailable")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Service health and tool availability",
                    "responses": { "200": { "description": "Health report" } }
                }
            },
            "/ready": {
                "get": {
                    "summary": "Readiness check",
                    "responses": {
                        "200": { "description": "Ready" },
                        "503": { "description": "PDF rasterizer unavailable" }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ProcessFileRequest": {
                    "type": "object",
                    "required": ["file_base64"],
                    "properties": {
                        "file_base64": { "type": "string", "description": "File content, base64 encoded. A data URL prefix is accepted." },
                        "filename": { "type": "string", "nullable": true, "description": "Optional name, used only for logging." }
                    }
                },
                "ContentBlock": {
                    "type": "object",
                    "required": ["type", "content"],
                    "properties": {
                        "type": { "type": "string", "enum": ["bloco_texto", "bloco_imagem"] },
                        "source_page": { "type": "integer", "nullable": true },
                        "content": {
                            "oneOf": [
                                { "type": "string" },
                                {
                                    "type": "object",
                                    "properties": {
                                        "original_mime_type": { "type": "string" },
                                        "image_base64_png": { "type": "string" }
                                    }
                                }
                            ]
                        }
                    }
                },
                "ProcessFileResponse": {
                    "type": "object",
                    "properties": {
                        "status": { "type": "string", "enum": ["success", "error"] },
                        "content_type": { "type": "string", "enum": ["documento_unificado", "unsupported", "error"] },
                        "detected_type": { "type": "string", "nullable": true, "enum": ["pdf", "docx", "xlsx", "image", "unknown"] },
                        "mime_type": { "type": "string", "nullable": true },
                        "data": { "type": "array", "nullable": true, "items": block_ref },
                        "message": { "type": "string" },
                        "processing_time_ms": { "type": "integer" }
                    }
                }
            }
        }
    })
});

fn envelope_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ProcessFileResponse" }
            }
        }
    })
}

/// `GET /openapi.json`
pub async fn openapi_handler() -> Json<Value> {
    Json(OPENAPI.clone())
}

/// `GET /docs`
pub async fn swagger_ui_handler() -> Html<String> {
    Html(format!(
        r##"<!DOCTYPE html>
<html>
<head>
<title>{title} - Swagger UI</title>
<meta charset="utf-8"/>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
SwaggerUIBundle({{ url: "/openapi.json", dom_id: "#swagger-ui" }});
</script>
</body>
</html>"##,
        title = TITLE
    ))
}

/// `GET /redoc`
pub async fn redoc_handler() -> Html<String> {
    Html(format!(
        r##"<!DOCTYPE html>
<html>
<head>
<title>{title} - ReDoc</title>
<meta charset="utf-8"/>
</head>
<body>
<redoc spec-url="/openapi.json"></redoc>
<script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>"##,
        title = TITLE
    ))
}
