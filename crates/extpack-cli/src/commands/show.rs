use super::{json_pretty, label, EXIT_SUCCESS};
use extpack_core::read_package_identity_file;
use std::path::Path;

pub fn run(package: &Path, json: bool) -> Result<u8, String> {
    let identity = read_package_identity_file(package).map_err(|e| e.to_string())?;
    if json {
        let payload = serde_json::json!({
            "id": identity.id,
            "version": identity.version,
            "publisher": identity.publisher,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{}        {}", label("id"), identity.id);
        println!("{}   {}", label("version"), identity.version);
        println!("{} {}", label("publisher"), identity.publisher);
    }
    Ok(EXIT_SUCCESS)
}
