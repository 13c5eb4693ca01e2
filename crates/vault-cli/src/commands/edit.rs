use vault_core::generator::{generate_password, PasswordOptions};
use vault_core::{ActionOutcome, EditSession};

use crate::cli::FieldArgs;
use crate::commands::common::{
    apply_fields, normalize_cipher_identifier, open_vault, resolve_cipher_id, VaultPaths,
};
use crate::config::CliConfig;
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    fields: &FieldArgs,
    assume_yes: bool,
    paths: &VaultPaths,
    config: &CliConfig,
) -> Result<ActionOutcome, CliError> {
    if fields.is_empty() {
        return Err(CliError::NothingToEdit);
    }

    let normalized_id = normalize_cipher_identifier(id)?;
    let vault = open_vault(paths).await?;
    let cipher_id = resolve_cipher_id(&normalized_id, &vault.store).await?;

    let mut session = EditSession::open(
        cipher_id,
        vault.collaborators(config, assume_yes),
        config.editor,
    )
    .await?;
    let outcome = edit_and_save(&mut session, fields).await;
    if !matches!(outcome, Ok(ActionOutcome::Completed)) {
        session.close();
    }

    let outcome = outcome?;
    if outcome == ActionOutcome::Completed {
        println!("{cipher_id}");
    }
    Ok(outcome)
}

async fn edit_and_save(
    session: &mut EditSession,
    fields: &FieldArgs,
) -> Result<ActionOutcome, CliError> {
    let folders = session
        .folders()
        .ok_or_else(|| CliError::CipherNotFound(session.cipher_id().to_string()))?;
    apply_fields(session.form_mut()?, fields, &folders)?;

    if let Some(totp) = fields.totp.as_deref() {
        session.form_mut()?.totp = totp.trim().to_string();
    }

    if fields.generate_password {
        let password = generate_password(&PasswordOptions::default())?;
        if !session.apply_generated_password(&password).await? {
            return Ok(ActionOutcome::Cancelled);
        }
    }

    Ok(session.save().await?)
}
