// ABOUTME: Publish command implementation.
// ABOUTME: Ensures registry resources exist, then publishes workspace packages in dependency order.

use deckhand::config::{Config, EnvSnapshot};
use deckhand::error::Result;
use deckhand::output::Output;
use deckhand::publish::{NpmPublisher, PublishStatus, discover_packages, publish_all, publish_order};
use deckhand::registry::{AwsCodeArtifact, TokenIssuer, ensure_registry};
use deckhand::report::RunStatus;
use std::path::Path;

pub async fn publish(workspace: &Path, mut output: Output) -> Result<RunStatus> {
    output.start_timer();
    let config = Config::discover(workspace)?;
    let registry = config.registry()?;

    let packages = publish_order(discover_packages(&workspace.join(&registry.packages_dir))?)?;
    if packages.is_empty() {
        output.success("No publishable packages found");
        return Ok(RunStatus::Succeeded);
    }

    let client = AwsCodeArtifact::new(EnvSnapshot::from_process())
        .domain_owner(registry.domain_owner.clone());

    for (resource, status) in ensure_registry(&client, registry).await? {
        output.progress(&format!("  → {resource}: {status}"));
    }

    let token = client
        .authorization_token(&registry.domain, registry.token_ttl)
        .await?;
    let url = client
        .registry_endpoint(&registry.domain, &registry.repository, &registry.format)
        .await?;

    output.progress(&format!("Publishing {} package(s) to {url}", packages.len()));
    let results = match publish_all(&NpmPublisher::default(), &packages, &url, &token.token).await {
        Ok(results) => results,
        Err(e) => {
            output.error(&e.to_string());
            return Ok(RunStatus::SomeFailed);
        }
    };

    for result in &results {
        let verb = match result.status {
            PublishStatus::Published => "published",
            PublishStatus::AlreadyExists => "already published",
        };
        output.progress(&format!("  ✓ {}@{} {verb}", result.name, result.version));
    }

    let published = results
        .iter()
        .filter(|r| r.status == PublishStatus::Published)
        .count();
    output.success(&format!(
        "Published {published} package(s), {} already present",
        results.len() - published
    ));
    Ok(RunStatus::Succeeded)
}
