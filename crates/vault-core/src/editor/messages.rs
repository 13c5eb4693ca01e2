//! User-facing strings shown by the edit workflow.

pub const FOLDER_NONE: &str = "No Folder";

pub const ERROR_TITLE: &str = "An error has occurred";
pub const GENERIC_ERROR: &str = "An error has occurred.";

pub const NO_CONNECTION_TITLE: &str = "Internet Connection Required";
pub const NO_CONNECTION_MESSAGE: &str =
    "Please connect to the internet before continuing.";

pub const SAVING: &str = "Saving...";
pub const DELETING: &str = "Deleting...";
pub const ITEM_UPDATED: &str = "Item updated.";
pub const ITEM_DELETED: &str = "Item deleted.";
pub const CONFIRM_DELETE: &str = "Do you really want to delete? This cannot be undone.";

pub const CONFIRM_PASSWORD_OVERWRITE: &str =
    "Are you sure you want to overwrite the current password?";
pub const PASSWORD_GENERATED: &str = "Password generated.";
pub const AUTHENTICATOR_KEY_ADDED: &str = "Authenticator key added.";
pub const AUTHENTICATOR_KEY_READ_ERROR: &str = "Cannot read authenticator key.";
