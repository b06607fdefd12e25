//! services/api/src/bin/openapi.rs
//!
//! Writes the FoodShare API's OpenAPI document to disk, for client generation
//! and review. Usage: `openapi [OUTPUT_PATH]` (defaults to `openapi.json`).

use api_lib::web::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let doc = ApiDoc::openapi();
    std::fs::write(&output, doc.to_pretty_json()?)?;
    println!("Wrote {} paths to {}", doc.paths.paths.len(), output);
    Ok(())
}
