use vault_core::generator::{generate_password, PasswordOptions};
use vault_core::util::{non_blank, normalize_text_option};
use vault_core::{Cipher, CipherId, CryptoService, FormState, OrganizationId, Scope};

use crate::cli::FieldArgs;
use crate::commands::common::{apply_fields, open_vault, VaultPaths};
use crate::error::CliError;

pub async fn run_add(
    fields: &FieldArgs,
    organization: Option<&str>,
    paths: &VaultPaths,
) -> Result<CipherId, CliError> {
    let name = fields
        .name
        .as_deref()
        .and_then(non_blank)
        .ok_or(CliError::MissingName)?;

    let mut vault = open_vault(paths).await?;
    let organization_id =
        normalize_text_option(organization.map(str::to_string)).map(OrganizationId::new);
    if let Some(organization_id) = &organization_id {
        vault.ensure_organization_key(organization_id)?;
    }

    let scope = Scope::from_organization(organization_id.as_ref());
    let mut draft = Cipher::new(vault.keys.encrypt(name.trim(), &scope)?);
    draft.organization_id = organization_id;

    let folders = vault.folder_options().await?;
    let mut form = FormState::default();
    apply_fields(&mut form, fields, &folders)?;
    if let Some(totp) = &fields.totp {
        form.totp.clone_from(totp);
    }
    if fields.generate_password {
        form.password = generate_password(&PasswordOptions::default())?;
    }

    let cipher = form.to_record(&draft, &folders, vault.keys.as_ref())?;
    vault.store.create_cipher(&cipher).await?;

    println!("{}", cipher.id);
    Ok(cipher.id)
}
