use crate::commands::common::{
    cipher_view, format_cipher_lines, open_vault, CipherView, VaultPaths,
};
use crate::error::CliError;

pub async fn list_cipher_views(paths: &VaultPaths) -> Result<Vec<CipherView>, CliError> {
    let vault = open_vault(paths).await?;
    let folders = vault.folder_options().await?;

    vault
        .store
        .list_ciphers()
        .await?
        .iter()
        .map(|cipher| {
            cipher_view(cipher, &folders, vault.keys.as_ref()).map(CipherView::redacted)
        })
        .collect()
}

pub async fn run_list(as_json: bool, paths: &VaultPaths) -> Result<(), CliError> {
    let views = list_cipher_views(paths).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        for line in format_cipher_lines(&views) {
            println!("{line}");
        }
    }

    Ok(())
}
