use serde::Serialize;
use vault_core::util::non_blank;
use vault_core::{CryptoService, Folder, FolderId, Scope};

use crate::commands::common::{open_vault, VaultPaths};
use crate::error::CliError;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FolderListItem {
    pub id: String,
    pub name: String,
}

pub async fn run_folder_add(name: &str, paths: &VaultPaths) -> Result<FolderId, CliError> {
    let name = non_blank(name).ok_or(CliError::EmptyFolderName)?.trim();

    let vault = open_vault(paths).await?;
    let folder = Folder::new(vault.keys.encrypt(name, &Scope::Personal)?);
    vault.store.create_folder(&folder).await?;

    println!("{}", folder.id);
    Ok(folder.id)
}

/// Folders in picker order, without the "no folder" entry
pub async fn list_folder_items(paths: &VaultPaths) -> Result<Vec<FolderListItem>, CliError> {
    let vault = open_vault(paths).await?;
    let folders = vault.folder_options().await?;

    Ok(folders
        .options()
        .iter()
        .filter_map(|option| {
            option.id.map(|id| FolderListItem {
                id: id.to_string(),
                name: option.label.clone(),
            })
        })
        .collect())
}

pub async fn run_folder_list(as_json: bool, paths: &VaultPaths) -> Result<(), CliError> {
    let items = list_folder_items(paths).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for item in &items {
            let short_id = item.id.chars().take(13).collect::<String>();
            println!("{short_id:<13}  {}", item.name);
        }
    }

    Ok(())
}
