use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "vault")]
#[command(about = "Edit stored logins from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local vault database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Keep the vault keys in this file instead of the OS keychain
    #[arg(long, global = true, value_name = "PATH")]
    pub key_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new login
    #[command(alias = "new")]
    Add {
        #[command(flatten)]
        fields: FieldArgs,
        /// Share the login with an organization
        #[arg(long, value_name = "ID")]
        organization: Option<String>,
    },
    /// List stored logins
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one login
    Show {
        /// Cipher ID or unique ID prefix
        id: String,
        /// Print the password instead of masking it
        #[arg(long)]
        reveal: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing login
    Edit {
        /// Cipher ID or unique ID prefix
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
        /// Answer yes to every confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete an existing login
    Delete {
        /// Cipher ID or unique ID prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Manage folders
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Generate a random password
    Generate {
        #[command(flatten)]
        options: GeneratorArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

/// Login fields shared by `add` and `edit`; omitted flags leave a field untouched
#[derive(Args, Debug, Default, Clone)]
pub struct FieldArgs {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,
    /// Website address
    #[arg(long)]
    pub uri: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long, conflicts_with = "generate_password")]
    pub password: Option<String>,
    /// Authenticator key
    #[arg(long)]
    pub totp: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Folder name; an empty value removes the login from its folder
    #[arg(long)]
    pub folder: Option<String>,
    /// Mark as favorite
    #[arg(long, conflicts_with = "no_favorite")]
    pub favorite: bool,
    /// Remove the favorite mark
    #[arg(long)]
    pub no_favorite: bool,
    /// Replace the password with a generated one
    #[arg(long)]
    pub generate_password: bool,
}

impl FieldArgs {
    /// Requested favorite flag, if any
    pub const fn favorite_flag(&self) -> Option<bool> {
        if self.favorite {
            Some(true)
        } else if self.no_favorite {
            Some(false)
        } else {
            None
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.uri.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.totp.is_none()
            && self.notes.is_none()
            && self.folder.is_none()
            && self.favorite_flag().is_none()
            && !self.generate_password
    }
}

#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct GeneratorArgs {
    /// Password length
    #[arg(short, long, default_value = "14")]
    pub length: usize,
    /// Leave out uppercase letters
    #[arg(long)]
    pub no_uppercase: bool,
    /// Leave out lowercase letters
    #[arg(long)]
    pub no_lowercase: bool,
    /// Leave out digits
    #[arg(long)]
    pub no_numbers: bool,
    /// Include special characters
    #[arg(long)]
    pub special: bool,
    /// Minimum number of digits
    #[arg(long, default_value = "1")]
    pub min_numbers: usize,
    /// Minimum number of special characters
    #[arg(long, default_value = "1")]
    pub min_special: usize,
    /// Avoid look-alike characters
    #[arg(long)]
    pub avoid_ambiguous: bool,
}

#[derive(Subcommand)]
pub enum FolderCommands {
    /// Create a folder
    Add {
        /// Folder name
        name: String,
    },
    /// List folders
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
