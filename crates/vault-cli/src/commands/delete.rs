use vault_core::{ActionOutcome, EditSession};

use crate::commands::common::{
    normalize_cipher_identifier, open_vault, resolve_cipher_id, VaultPaths,
};
use crate::config::CliConfig;
use crate::error::CliError;

pub async fn run_delete(
    id: &str,
    assume_yes: bool,
    paths: &VaultPaths,
    config: &CliConfig,
) -> Result<ActionOutcome, CliError> {
    let normalized_id = normalize_cipher_identifier(id)?;
    let vault = open_vault(paths).await?;
    let cipher_id = resolve_cipher_id(&normalized_id, &vault.store).await?;

    let mut session = EditSession::open(
        cipher_id,
        vault.collaborators(config, assume_yes),
        config.editor,
    )
    .await?;

    let outcome = session.delete().await;
    match outcome {
        Ok(ActionOutcome::Completed) => println!("{cipher_id}"),
        _ => session.close(),
    }
    Ok(outcome?)
}
