use vault_core::generator::{generate_password, PasswordOptions};

use crate::cli::GeneratorArgs;
use crate::error::CliError;

impl From<&GeneratorArgs> for PasswordOptions {
    fn from(args: &GeneratorArgs) -> Self {
        Self {
            length: args.length,
            uppercase: !args.no_uppercase,
            lowercase: !args.no_lowercase,
            numbers: !args.no_numbers,
            special: args.special,
            min_numbers: args.min_numbers,
            min_special: args.min_special,
            avoid_ambiguous: args.avoid_ambiguous,
        }
    }
}

pub fn run_generate(args: &GeneratorArgs) -> Result<(), CliError> {
    let password = generate_password(&PasswordOptions::from(args))?;
    println!("{password}");
    Ok(())
}
