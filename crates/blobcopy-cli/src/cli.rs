use clap::Parser;

use blobcopy_mirror::{CipherMode, MirrorOptions, SafetyPolicy};

#[derive(Parser, Debug)]
#[command(
    name = "blobcopy",
    about = "Mirror objects between blob stores, optionally encrypting them",
    version
)]
pub struct Cli {
    /// Source store URL (`mem://`, `file:///path` or a directory)
    pub source: String,

    /// Destination store URL
    pub destination: String,

    /// Staging store, useful for calculating content hashes
    #[arg(long = "tmp-bkt", value_name = "URL")]
    pub tmp_bkt: Option<String>,

    /// Skip the first N objects in listing order
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub skip: u64,

    /// Encrypt content and key names with the password
    #[arg(long, group = "cipher")]
    pub encrypt: bool,

    /// Decrypt content and key names with the password
    #[arg(long, group = "cipher")]
    pub decrypt: bool,

    /// Refuse to run unless the encrypted store carries this password's
    /// safety marker (requires --encrypt or --decrypt)
    #[arg(long, requires = "cipher")]
    pub safety: bool,

    /// Write the safety marker when the check fails
    #[arg(long, requires = "safety", conflicts_with = "decrypt")]
    pub gen_safety: bool,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    pub fn mirror_options(&self) -> MirrorOptions {
        let cipher = match (self.encrypt, self.decrypt) {
            (true, _) => CipherMode::Encrypt,
            (_, true) => CipherMode::Decrypt,
            _ => CipherMode::None,
        };
        let safety = match (self.safety, self.gen_safety) {
            (false, _) => SafetyPolicy::Off,
            (true, false) => SafetyPolicy::Check,
            (true, true) => SafetyPolicy::CheckOrGenerate,
        };
        MirrorOptions {
            skip: self.skip,
            cipher,
            safety,
            staging_url: self.tmp_bkt.clone(),
        }
    }
}
