use serde::{Deserialize, Serialize};

/// Name of the environment variable holding the encryption password.
pub const PASSWORD_ENV: &str = "BLOBCOPY_ENCRYPTION_PASSWORD";

/// Staging URL used when a cipher is requested without an explicit
/// staging store.
pub const DEFAULT_STAGING_URL: &str = "mem://";

/// Which direction, if any, the run transforms content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    #[default]
    None,
    Encrypt,
    Decrypt,
}

/// How the run treats the safety marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyPolicy {
    /// No marker check.
    #[default]
    Off,
    /// Abort unless the marker matches.
    Check,
    /// Check, and write the marker if it is missing or belongs to another key.
    CheckOrGenerate,
}

/// Settings for one mirror run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorOptions {
    /// Number of leading objects in listing order to pass over.
    pub skip: u64,
    /// Content and key transform direction.
    pub cipher: CipherMode,
    /// Safety marker handling.
    pub safety: SafetyPolicy,
    /// Staging store URL; `None` disables staging unless a cipher is set.
    pub staging_url: Option<String>,
}

impl MirrorOptions {
    /// The staging URL to open for this run, if any.
    ///
    /// Encrypting or decrypting always stages, falling back to an
    /// in-memory store.
    pub fn effective_staging_url(&self) -> Option<&str> {
        match (&self.staging_url, self.cipher) {
            (Some(url), _) => Some(url.as_str()),
            (None, CipherMode::None) => None,
            (None, _) => Some(DEFAULT_STAGING_URL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = MirrorOptions::default();
        assert_eq!(opts.skip, 0);
        assert_eq!(opts.cipher, CipherMode::None);
        assert_eq!(opts.safety, SafetyPolicy::Off);
        assert_eq!(opts.effective_staging_url(), None);
    }

    #[test]
    fn cipher_forces_staging() {
        let opts = MirrorOptions {
            cipher: CipherMode::Encrypt,
            ..Default::default()
        };
        assert_eq!(opts.effective_staging_url(), Some("mem://"));

        let opts = MirrorOptions {
            cipher: CipherMode::Decrypt,
            staging_url: Some("/tmp/scratch".into()),
            ..Default::default()
        };
        assert_eq!(opts.effective_staging_url(), Some("/tmp/scratch"));
    }

    #[test]
    fn explicit_staging_without_cipher() {
        let opts = MirrorOptions {
            staging_url: Some("mem://".into()),
            ..Default::default()
        };
        assert_eq!(opts.effective_staging_url(), Some("mem://"));
    }

    #[test]
    fn serde_names() {
        let opts = MirrorOptions {
            skip: 3,
            cipher: CipherMode::Encrypt,
            safety: SafetyPolicy::CheckOrGenerate,
            staging_url: None,
        };
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["cipher"], "encrypt");
        assert_eq!(json["safety"], "check-or-generate");
        let back: MirrorOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back, opts);
    }
}
