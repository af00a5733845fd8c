// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates stagehand.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Coordinates;

use super::CONFIG_FILENAME;

const DEFAULT_GROUP: &str = "com.example";

/// Write a template `stagehand.yml` into `dir`.
pub fn init_config(dir: &Path, group_id: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let group_id = group_id.unwrap_or(DEFAULT_GROUP);
    let coordinates = Coordinates::new(group_id, "my-library", "1.0.0")
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

    std::fs::write(&config_path, template_yaml(&coordinates))?;
    Ok(())
}

fn template_yaml(coordinates: &Coordinates) -> String {
    format!(
        r#"deployers:
  central:
    url: https://staging.example.org/service/local
    # snapshot_url: https://staging.example.org/content/repositories/snapshots
    username: {{ env: STAGING_USERNAME }}
    password: {{ env: STAGING_PASSWORD }}
    # verify_url: "https://repo.example.org/maven2/{{{{path}}}}/{{{{filename}}}}"
    # start_stage: upload
    # end_stage: release
    transition_delay: 10s
    transition_max_retries: 60
artifacts:
  - coordinates: {coordinates}
    path: build/{artifact}-{version}.jar
"#,
        artifact = coordinates.artifact_id(),
        version = coordinates.version(),
    )
}
