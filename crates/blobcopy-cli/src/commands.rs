use std::sync::Arc;

use anyhow::{anyhow, Context};
use colored::Colorize;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use blobcopy_crypto::{EncryptionKey, Transform};
use blobcopy_mirror::{
    CipherMode, MirrorEngine, MirrorError, MirrorReport, SafetyGuard, SafetyOutcome,
    SafetyPolicy,
};
use blobcopy_store::{open_store, BlobStore};

use crate::cli::{Cli, OutputFormat};
use crate::password;

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let key = match cli.mirror_options().cipher {
        CipherMode::None => None,
        CipherMode::Encrypt | CipherMode::Decrypt => Some(password::obtain_key()?),
    };
    let report = execute(&cli, key).await?;
    print_report(&report, cli.format)
}

fn open(role: &str, url: &str) -> anyhow::Result<Arc<dyn BlobStore>> {
    open_store(url).with_context(|| format!("opening {role} store {url}"))
}

/// Open the stores, gate on the safety marker, and run the mirror.
pub async fn execute(cli: &Cli, key: Option<EncryptionKey>) -> anyhow::Result<MirrorReport> {
    let options = cli.mirror_options();
    let (encrypt, decrypt) = match options.cipher {
        CipherMode::None => (None, None),
        CipherMode::Encrypt => (key, None),
        CipherMode::Decrypt => (None, key),
    };
    let transform = Transform::from_keys(encrypt, decrypt)
        .ok_or_else(|| anyhow!("--encrypt and --decrypt are mutually exclusive"))?;
    if transform.is_identity() && options.cipher != CipherMode::None {
        return Err(anyhow!("an encryption password is required"));
    }
    let span = info_span!("blobcopy");

    let source = open("source", &cli.source)?;
    let destination = open("destination", &cli.destination)?;

    if options.safety != SafetyPolicy::Off {
        let key = transform.key().ok_or(MirrorError::SafetyWithoutKey)?;
        let guard = SafetyGuard::new(key, span.clone())?;
        // A decrypt run checks the encrypted side, which is the source.
        let marked = match options.cipher {
            CipherMode::Decrypt => &source,
            _ => &destination,
        };
        match guard.gate(marked.as_ref(), options.safety).await {
            Ok(SafetyOutcome::Generated) => {
                warn!(parent: &span, "safety marker generated for this password")
            }
            Ok(_) => {}
            Err(MirrorError::SafetyCheckFailed) => {
                return Err(anyhow!(
                    "safety check failed; use --gen-safety to generate a safety check with this password"
                ));
            }
            Err(e) => return Err(e).context("running safety check"),
        }
    }

    let mut engine = MirrorEngine::new(source, destination)
        .with_transform(transform)
        .with_skip(options.skip)
        .with_span(span.clone());
    if let Some(url) = options.effective_staging_url() {
        info!(parent: &span, url, "using staging store");
        engine = engine.with_staging(open("staging", url)?);
    }

    Ok(engine.mirror().await)
}

fn print_report(report: &MirrorReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let mark = if report.is_clean() {
                "✓".green().bold()
            } else {
                "!".yellow().bold()
            };
            println!("{mark} {report}");
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("blobcopy").chain(args.iter().copied())).unwrap()
    }

    fn dir_with(files: &[(&str, &[u8])]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, data) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
        }
        dir
    }

    fn path(dir: &tempfile::TempDir) -> &str {
        dir.path().to_str().unwrap()
    }

    #[tokio::test]
    async fn mirrors_between_directories() {
        let src = dir_with(&[("a.txt", &[1u8; 100][..]), ("nested/b.txt", &[2u8; 50][..])]);
        let dst = tempfile::tempdir().unwrap();

        let report = execute(&cli(&[path(&src), path(&dst)]), None).await.unwrap();
        assert_eq!((report.copied, report.errors), (2, 0));
        assert_eq!(std::fs::read(dst.path().join("nested/b.txt")).unwrap(), vec![2u8; 50]);

        let again = execute(&cli(&[path(&src), path(&dst)]), None).await.unwrap();
        assert_eq!(again.copied, 0);
    }

    #[tokio::test]
    async fn encrypted_round_trip_through_directories() {
        let src = dir_with(&[("secret.txt", &b"attack at dawn"[..])]);
        let enc = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let key = EncryptionKey::from_password("pw");

        let report = execute(&cli(&["--encrypt", path(&src), path(&enc)]), Some(key.clone()))
            .await
            .unwrap();
        assert_eq!(report.copied, 1);
        assert!(!enc.path().join("secret.txt").exists());

        let report = execute(&cli(&["--decrypt", path(&enc), path(&out)]), Some(key))
            .await
            .unwrap();
        assert_eq!(report.copied, 1);
        assert_eq!(std::fs::read(out.path().join("secret.txt")).unwrap(), b"attack at dawn");
    }

    #[tokio::test]
    async fn safety_check_without_generate_aborts() {
        let src = dir_with(&[("x", &b"x"[..])]);
        let dst = tempfile::tempdir().unwrap();
        let key = EncryptionKey::from_password("pw");

        let err = execute(&cli(&["--encrypt", "--safety", path(&src), path(&dst)]), Some(key))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--gen-safety"));
        assert_eq!(std::fs::read_dir(dst.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn generated_marker_admits_same_password_only() {
        let src = dir_with(&[("x", &b"x"[..])]);
        let dst = tempfile::tempdir().unwrap();
        let args = ["--encrypt", "--safety", "--gen-safety", path(&src), path(&dst)];
        execute(&cli(&args), Some(EncryptionKey::from_password("pw")))
            .await
            .unwrap();

        let check = ["--encrypt", "--safety", path(&src), path(&dst)];
        let report = execute(&cli(&check), Some(EncryptionKey::from_password("pw")))
            .await
            .unwrap();
        assert_eq!(report.copied, 0);
        assert!(execute(&cli(&check), Some(EncryptionKey::from_password("other")))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn decrypt_checks_marker_in_source() {
        let src = dir_with(&[("report.txt", &b"quarterly"[..])]);
        let enc = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let args = ["--encrypt", "--safety", "--gen-safety", path(&src), path(&enc)];
        execute(&cli(&args), Some(EncryptionKey::from_password("pw")))
            .await
            .unwrap();

        let decrypt = ["--decrypt", "--safety", path(&enc), path(&out)];
        let err = execute(&cli(&decrypt), Some(EncryptionKey::from_password("other")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("safety check failed"), "{err}");
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);

        let report = execute(&cli(&decrypt), Some(EncryptionKey::from_password("pw")))
            .await
            .unwrap();
        assert_eq!((report.copied, report.errors, report.excluded), (1, 0, 1));
        assert_eq!(std::fs::read(out.path().join("report.txt")).unwrap(), b"quarterly");
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn unopenable_store_is_fatal() {
        let dst = tempfile::tempdir().unwrap();
        let err = execute(&cli(&["s3://bucket", path(&dst)]), None).await.unwrap_err();
        assert!(err.to_string().contains("opening source store"));
    }

    #[tokio::test]
    async fn cipher_without_key_is_rejected() {
        let err = execute(&cli(&["--encrypt", "mem://", "mem://"]), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("password"));
    }
}
