//! Authenticate the session before the wish-list is read.

use tracing::info;

use crate::error::Result;
use crate::pipeline::{required, wait_for_anchor};
use crate::security::Credentials;
use crate::traits::page::{keys, PageSession};
use crate::types::config::AgentConfig;

/// Fill in the login form and wait until the post-login page appears.
///
/// A login that never lands on the success anchor fails with
/// `NavigationTimeout`, which ends the run.
pub async fn login<P: PageSession + ?Sized>(
    session: &mut P,
    config: &AgentConfig,
    credentials: &Credentials,
) -> Result<()> {
    let layout = &config.layout;
    let url = &layout.login_url;
    session.navigate(url).await?;

    let email = required(session.find(None, &layout.login_email).await, url)?;
    session.send_keys(&email, &credentials.email).await?;

    let password = required(session.find(None, &layout.login_password).await, url)?;
    session.send_keys(&password, credentials.password.expose()).await?;
    session.send_keys(&password, keys::ENTER).await?;

    wait_for_anchor(session, config, url, &layout.login_success).await?;
    info!(email = %credentials.email, "Logged in");
    Ok(())
}
