// ABOUTME: Config scaffolding for new workspaces.
// ABOUTME: Creates deckhand.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(&Config::template());
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let directories = config
        .discovery
        .directories
        .iter()
        .map(|d| format!("    - {}", d.display()))
        .collect::<Vec<_>>()
        .join("\n");
    let registry = config.registry.clone().unwrap_or_else(super::RegistryConfig::template);

    format!(
        r#"discovery:
  directories:
{directories}
  manifest: {manifest}

# Each stage picks a change detection strategy (content | revision)
# and a credential policy (keys | keys-or-profile).
stages:
  dev:
    detection: content
    credentials: keys-or-profile
  prod:
    detection: revision
    credentials: keys
default_stage: {default_stage}

# Delay between deployment batches
pacing: {pacing}s
state_file: {state_file}

tool:
  command: {command}
  min_version: {min_version}
  require_access_key: {require_access_key}
  # login: true

registry:
  domain: {domain}
  repository: {repository}
  namespace: "{namespace}"
  upstream: {upstream}
  token_ttl: 12h
  packages_dir: {packages_dir}
"#,
        manifest = config.discovery.manifest,
        default_stage = config.default_stage,
        pacing = config.pacing.as_secs(),
        state_file = config.state_file.display(),
        command = config.tool.command,
        min_version = config.tool.min_version,
        require_access_key = config.tool.require_access_key,
        domain = registry.domain,
        repository = registry.repository,
        namespace = registry.namespace,
        upstream = registry.upstream.as_deref().unwrap_or("public:npmjs"),
        packages_dir = registry.packages_dir.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_round_trips_through_parser() {
        let yaml = generate_template_yaml(&Config::template());
        let config = Config::from_yaml(&yaml).unwrap();

        assert_eq!(config.default_stage.as_str(), "dev");
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.registry().unwrap().namespace, "@my-org");
    }
}
