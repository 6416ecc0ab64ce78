//! certrule: Command-line tool for validating X.509 certificates against trust rules.

use anyhow::{Context, Result};
use certrule_lib::{
    parse_cert, CertificateBucket, ChainRule, CriticalExtensionRule, ExpirationRule,
    KeyStoreCertificateBucket, Mod11OrganizationNumber, OrganizationNumberRule,
    PrincipalNameRule, SimpleCertificateBucket, SimplePrincipalNameProvider, ValidationReport,
    Validator, ValidatorBuilder,
};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "certrule",
    about = "Validate X.509 certificates against composable trust rules",
    long_about = "certrule checks certificates in PEM or DER format against a trust\n\
                  policy built from command-line flags: a chain to a trusted root,\n\
                  the validity window, and identity attributes of the subject.\n\n\
                  Input format (PEM vs DER) is auto-detected. Commands read from\n\
                  stdin when no file is given.",
    after_help = "EXAMPLES:\n\
                  \n  certrule validate --keystore truststore.p12 --password changeit cert.pem\
                  \n  certrule validate --roots root.pem --intermediates ca.pem --country NO cert.pem\
                  \n  certrule validate --roots root.pem --mod11 --json cert.pem\
                  \n  certrule validate --roots bundle.pem --expiry-margin 30d certs/\
                  \n  certrule lookup --keystore truststore.p12 --password changeit cert.pem\
                  \n  cat cert.pem | certrule validate --roots root.pem"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate certificates against the configured rules
    #[command(after_help = "Exit status is 0 when every certificate is accepted, 2 when\n\
                      at least one was rejected, and 1 on usage or I/O errors.")]
    Validate {
        /// Certificate file or directory (PEM or DER). Reads from stdin if omitted.
        input: Option<PathBuf>,

        #[command(flatten)]
        stores: StoreArgs,

        /// PEM bundle of intermediate certificates
        #[arg(long)]
        intermediates: Option<PathBuf>,

        /// Skip the chain-of-trust check
        #[arg(long)]
        no_chain: bool,

        /// Accepted subject country codes (repeatable)
        #[arg(long = "country", value_name = "CODE")]
        countries: Vec<String>,

        /// Accepted organization numbers (repeatable)
        #[arg(long = "org-number", value_name = "NUMBER")]
        org_numbers: Vec<String>,

        /// Require an organization number with a valid MOD11 checksum
        #[arg(long, conflicts_with = "org_numbers")]
        mod11: bool,

        /// Reject certificates expiring within this period (e.g. 30d, 12h)
        #[arg(long, value_parser = parse_duration)]
        expiry_margin: Option<Duration>,

        /// Check validity at this Unix timestamp instead of now
        #[arg(long)]
        at_time: Option<i64>,

        /// Critical extensions the relying party understands (OID, repeatable).
        /// When given, certificates with any other critical extension are rejected.
        #[arg(long = "recognize", value_name = "OID")]
        recognized: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Recurse into subdirectories (directory input only)
        #[arg(short, long)]
        recurse: bool,

        /// Only print rejected certificates (directory input only)
        #[arg(long)]
        failures_only: bool,
    },
    /// Find the issuer of a certificate in a trust store
    Lookup {
        /// Certificate file (PEM or DER). Reads from stdin if omitted.
        input: Option<PathBuf>,

        #[command(flatten)]
        stores: StoreArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// PKCS#12 trust store
    #[arg(long, conflicts_with = "roots")]
    keystore: Option<PathBuf>,

    /// Password for --keystore
    #[arg(long, env = "CERTRULE_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// PEM bundle or directory of trusted roots (default: system trust store)
    #[arg(long)]
    roots: Option<PathBuf>,
}

impl StoreArgs {
    fn load(&self) -> Result<Arc<dyn CertificateBucket>> {
        let bucket: Arc<dyn CertificateBucket> = if let Some(path) = &self.keystore {
            Arc::new(
                KeyStoreCertificateBucket::from_file(path, &self.password)
                    .with_context(|| format!("Failed to open key store: {}", path.display()))?,
            )
        } else if let Some(path) = &self.roots {
            Arc::new(load_pem_bucket(path)?)
        } else {
            Arc::new(
                SimpleCertificateBucket::system().context("Failed to load system trust store")?,
            )
        };
        tracing::debug!(certificates = bucket.len(), "trust store loaded");
        Ok(bucket)
    }
}

fn load_pem_bucket(path: &Path) -> Result<SimpleCertificateBucket> {
    let bucket = if path.is_dir() {
        SimpleCertificateBucket::from_pem_directory(path)
    } else {
        SimpleCertificateBucket::from_pem_file(path)
    };
    bucket.with_context(|| format!("Failed to load certificates: {}", path.display()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Maximum file size for certificate inputs (10 MiB).
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Parse a duration string using humantime format.
///
/// Plain numbers (e.g. "3600") default to seconds. Otherwise, standard
/// humantime units are accepted: `s`, `m`, `h`, `d`, `w`, `months`, `y`, etc.
///
/// Examples: "30", "30s", "5m", "2h30m", "7d", "1w", "30days".
fn parse_duration(s: &str) -> Result<Duration> {
    // Plain integer: treat as seconds
    if s.chars().all(|c| c.is_ascii_digit()) {
        let secs: u64 = s.parse().context("Invalid duration value")?;
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).with_context(|| format!("Invalid duration: '{s}'"))
}

/// Check if a path has a certificate file extension (.pem or .der).
fn is_cert_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("der")
            || ext.eq_ignore_ascii_case("crt") || ext.eq_ignore_ascii_case("cer")
    )
}

/// Find all certificate files (.pem, .der, .crt, .cer) in a directory.
fn find_cert_files(dir: &Path, recurse: bool) -> Vec<PathBuf> {
    let walker = if recurse {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_cert_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// A single result from batch processing.
struct BatchResult {
    path: String,
    pass: bool,
    detail: String,
}

/// Process certificate files in parallel, printing `filename: result`.
///
/// Returns the number of failures.
fn run_batch<F>(files: &[PathBuf], failures_only: bool, op: F) -> usize
where
    F: Fn(&Path) -> BatchResult + Sync,
{
    let results: Vec<BatchResult> = files.par_iter().map(|f| op(f)).collect();

    let mut failures = 0;
    for r in &results {
        if !r.pass {
            failures += 1;
        }
        if failures_only && r.pass {
            continue;
        }
        if r.pass {
            println!("{}: {}", r.path, r.detail);
        } else {
            eprintln!("{}: {}", r.path, r.detail);
        }
    }
    failures
}

/// Validate one file for batch mode. Unreadable or undecodable files count
/// as failures.
fn validate_file(validator: &Validator, path: &Path) -> BatchResult {
    let label = path.display().to_string();
    let outcome = std::fs::read(path)
        .map_err(anyhow::Error::from)
        .and_then(|data| Ok(parse_cert(&data)?));
    match outcome {
        Ok(cert) => {
            let report = validator.report(&cert);
            BatchResult {
                path: label,
                pass: report.is_valid,
                detail: format!("{}", report),
            }
        }
        Err(e) => BatchResult {
            path: label,
            pass: false,
            detail: format!("FAIL ({})", e),
        },
    }
}

/// Print a single-file validation report (JSON, text valid, or text invalid).
fn print_report(label: &str, report: &ValidationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else if report.is_valid {
        println!("{}: {}", label, report);
    } else {
        eprintln!("{}: {}", label, report);
    }
    Ok(())
}

struct Policy<'a> {
    stores: &'a StoreArgs,
    intermediates: Option<&'a PathBuf>,
    no_chain: bool,
    countries: &'a [String],
    org_numbers: &'a [String],
    mod11: bool,
    expiry_margin: Option<Duration>,
    at_time: Option<i64>,
    recognized: &'a [String],
}

impl Policy<'_> {
    fn build(&self) -> Result<Validator> {
        let mut expiration = ExpirationRule::new();
        if let Some(margin) = self.expiry_margin {
            expiration = expiration.margin(margin);
        }
        if let Some(ts) = self.at_time {
            expiration = expiration.at_time(ts);
        }
        let mut builder = ValidatorBuilder::new().add_rule(expiration);

        if !self.no_chain {
            let roots = self.stores.load()?;
            let intermediates: Arc<dyn CertificateBucket> = match self.intermediates {
                Some(path) => Arc::new(load_pem_bucket(path)?),
                None if self.stores.keystore.is_some() => Arc::clone(&roots),
                None => Arc::new(SimpleCertificateBucket::default()),
            };
            builder = builder.add_rule(ChainRule::new(roots, intermediates));
        }

        if !self.recognized.is_empty() {
            builder = builder.add_rule(CriticalExtensionRule::recognizes(
                self.recognized.iter().cloned(),
            ));
        }
        if !self.countries.is_empty() {
            builder = builder.add_rule(PrincipalNameRule::attribute(
                "C",
                SimplePrincipalNameProvider::new(self.countries.iter().cloned()),
            ));
        }
        if !self.org_numbers.is_empty() {
            builder = builder.add_rule(OrganizationNumberRule::new(
                SimplePrincipalNameProvider::new(self.org_numbers.iter().cloned()),
            ));
        }
        if self.mod11 {
            builder = builder.add_rule(OrganizationNumberRule::new(Mod11OrganizationNumber));
        }

        Ok(builder.build())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Validate {
            input,
            stores,
            intermediates,
            no_chain,
            countries,
            org_numbers,
            mod11,
            expiry_margin,
            at_time,
            recognized,
            json,
            recurse,
            failures_only,
        } => {
            let validator = Policy {
                stores,
                intermediates: intermediates.as_ref(),
                no_chain: *no_chain,
                countries,
                org_numbers,
                mod11: *mod11,
                expiry_margin: *expiry_margin,
                at_time: *at_time,
                recognized,
            }
            .build()?;

            if let Some(dir) = input.as_ref().filter(|p| p.is_dir()) {
                let files = find_cert_files(dir, *recurse);
                if files.is_empty() {
                    anyhow::bail!("No certificate files found in {}", dir.display());
                }
                let failures = run_batch(&files, *failures_only, |path| {
                    validate_file(&validator, path)
                });
                if failures > 0 {
                    std::process::exit(2);
                }
                return Ok(());
            }

            let data = read_input(input.as_ref())?;
            let cert = parse_cert(&data).context("Failed to parse certificate")?;
            let label = input
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdin".into());
            let report = validator.report(&cert);
            print_report(&label, &report, *json)?;
            if !report.is_valid {
                std::process::exit(2);
            }
        }
        Commands::Lookup { input, stores } => {
            let bucket = stores.load()?;
            let data = read_input(input.as_ref())?;
            let cert = parse_cert(&data).context("Failed to parse certificate")?;
            match bucket.find_by_subject(cert.issuer()) {
                Some(issuer) => {
                    println!("subject={}", issuer.subject());
                    println!("serial={}", issuer.serial());
                    println!("sha256={}", issuer.fingerprint());
                }
                None => {
                    eprintln!("no issuer found for {}", cert.issuer());
                    std::process::exit(2);
                }
            }
        }
    }

    Ok(())
}
