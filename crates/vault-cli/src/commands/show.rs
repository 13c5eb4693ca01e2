use vault_core::services::CipherStore;

use crate::commands::common::{
    cipher_view, format_cipher_details, normalize_cipher_identifier, open_vault,
    resolve_cipher_id, CipherView, VaultPaths,
};
use crate::error::CliError;

pub async fn load_cipher_view(
    id: &str,
    reveal: bool,
    paths: &VaultPaths,
) -> Result<CipherView, CliError> {
    let normalized_id = normalize_cipher_identifier(id)?;
    let vault = open_vault(paths).await?;
    let cipher_id = resolve_cipher_id(&normalized_id, &vault.store).await?;
    let cipher = vault
        .store
        .get_cipher(&cipher_id)
        .await?
        .ok_or(CliError::CipherNotFound(normalized_id))?;

    let folders = vault.folder_options().await?;
    let view = cipher_view(&cipher, &folders, vault.keys.as_ref())?;
    Ok(if reveal { view } else { view.redacted() })
}

pub async fn run_show(
    id: &str,
    reveal: bool,
    as_json: bool,
    paths: &VaultPaths,
) -> Result<(), CliError> {
    let view = load_cipher_view(id, reveal, paths).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        for line in format_cipher_details(&view) {
            println!("{line}");
        }
    }

    Ok(())
}
