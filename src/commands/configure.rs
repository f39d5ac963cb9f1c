// ABOUTME: Configure command implementation.
// ABOUTME: Mints a registry token and writes the consumer project's registry config.

use deckhand::config::{Config, EnvSnapshot};
use deckhand::error::{Error, Result};
use deckhand::output::Output;
use deckhand::registry::{AwsCodeArtifact, TokenIssuer, write_registry_config};
use deckhand::report::RunStatus;
use std::path::Path;

pub async fn configure(workspace: &Path, target_dir: &Path, mut output: Output) -> Result<RunStatus> {
    output.start_timer();
    if !target_dir.is_dir() {
        return Err(Error::NotADirectory(target_dir.to_path_buf()));
    }

    let config = Config::discover(workspace)?;
    let registry = config.registry()?;
    let client = AwsCodeArtifact::new(EnvSnapshot::from_process())
        .domain_owner(registry.domain_owner.clone());

    let token = client
        .authorization_token(&registry.domain, registry.token_ttl)
        .await?;
    let url = client
        .registry_endpoint(&registry.domain, &registry.repository, &registry.format)
        .await?;

    let written = write_registry_config(target_dir, &url, &token.token, &registry.scope())?;
    if let Some(backup) = &written.backup {
        output.progress(&format!("Previous config saved to {}", backup.display()));
    }

    output.success(&format!(
        "Wrote {} for {} (token expires {})",
        written.path.display(),
        registry.scope(),
        token.expires_at.format("%Y-%m-%d %H:%M UTC")
    ));
    Ok(RunStatus::Succeeded)
}
