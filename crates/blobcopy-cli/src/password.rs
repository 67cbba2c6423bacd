use std::env::VarError;
use std::io;

use anyhow::{bail, Context};
use blobcopy_crypto::EncryptionKey;
use blobcopy_mirror::PASSWORD_ENV;
use zeroize::Zeroizing;

/// Derive the run key from `BLOBCOPY_ENCRYPTION_PASSWORD`, or from a masked
/// terminal prompt when the variable is unset.
pub fn obtain_key() -> anyhow::Result<EncryptionKey> {
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => Zeroizing::new(password),
        Err(VarError::NotPresent) => {
            prompt_twice(|label: &str| rpassword::prompt_password(label))?
        }
        Err(e) => return Err(e).with_context(|| format!("reading {PASSWORD_ENV}")),
    };
    Ok(EncryptionKey::from_password(&password))
}

/// Ask for the password twice; both entries must match exactly.
pub fn prompt_twice<F>(mut prompt: F) -> anyhow::Result<Zeroizing<String>>
where
    F: FnMut(&str) -> io::Result<String>,
{
    let first = Zeroizing::new(
        prompt("Enter encryption password: ").context("reading encryption password")?,
    );
    let second = Zeroizing::new(
        prompt("Enter encryption password (verify): ").context("reading encryption password")?,
    );
    if *first != *second {
        bail!("passwords do not match");
    }
    Ok(first)
}
