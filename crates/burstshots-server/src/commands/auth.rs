//! The `auth` command.

use tracing::info;

use burstshots_photos::google::GoogleAuthorizer;

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Runs the Google authorization flow ahead of serving.
///
/// With a usable stored token this is a no-op unless `force` is set, in
/// which case the stored token is discarded first.
pub async fn run(config: &ServerConfig, force: bool) -> ServerResult<()> {
    let google_config = config.google.to_provider_config()?;
    let authorizer = GoogleAuthorizer::new(&google_config)?;

    if authorizer.has_valid_token() && !force {
        println!(
            "Already authorized as '{}' (tokens in {}).",
            config.google.identity,
            authorizer.token_path().display()
        );
        println!("Use --force to authorize again.");
        return Ok(());
    }

    println!("Starting Google Photos authorization...");
    println!();
    println!("A browser window will open for you to grant read-only access.");
    println!("If it doesn't, the URL to open is printed in the log.");
    println!();

    if force {
        authorizer.reauthorize().await?;
    } else {
        authorizer.authorize().await?;
    }

    info!("Google Photos authorization successful");
    println!("Authorization successful!");
    println!("Tokens saved to {}.", authorizer.token_path().display());
    Ok(())
}
