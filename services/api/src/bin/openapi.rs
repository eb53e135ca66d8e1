//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3.0 document of the REST API.
//!
//! Usage: `openapi [PATH]`. The default path is `openapi.json`; `-` prints to stdout.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args().nth(1).unwrap_or_else(|| "openapi.json".to_string());
    let spec_json = ApiDoc::openapi().to_pretty_json()?;

    if target == "-" {
        println!("{}", spec_json);
    } else {
        std::fs::write(&target, spec_json)?;
        eprintln!("OpenAPI specification written to {}", target);
    }
    Ok(())
}
