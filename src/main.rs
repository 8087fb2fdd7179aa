use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use certsign::error::Error;
use certsign::pipeline::{self, SecretPassword, SignRequest};
use certsign::secrets::AwsSecretsManagerStore;

#[derive(Parser)]
#[command(name = "certsign", version, about = "Sign X.509 certificate signing requests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign a CSR and print the resulting PEM to stdout
    Sign {
        /// CSR file, PEM or DER
        csr_file: PathBuf,
        /// Issuer certificate file, PEM
        crt_file: PathBuf,
        /// Issuer key: a PKCS#8 file path or an AWS KMS key ARN
        key_file: String,
        /// Append the issuer certificate after the leaf
        #[arg(long)]
        bundle: bool,
        /// Secrets Manager ARN holding the issuer key password
        #[arg(long, requires = "issuer_password_secret_key")]
        issuer_password_secret_arn: Option<String>,
        /// JSON field of the secret that holds the password
        #[arg(long, requires = "issuer_password_secret_arn")]
        issuer_password_secret_key: Option<String>,
        /// Deadline in seconds for each KMS call
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, Error> {
    match cli.command {
        Command::Sign {
            csr_file,
            crt_file,
            key_file,
            bundle,
            issuer_password_secret_arn,
            issuer_password_secret_key,
            timeout,
        } => {
            let csr = std::fs::read(&csr_file).map_err(|source| Error::Io {
                path: csr_file.clone(),
                source,
            })?;

            let store;
            let password_secret = match (&issuer_password_secret_arn, &issuer_password_secret_key)
            {
                (Some(reference), Some(field)) => {
                    store = AwsSecretsManagerStore::connect(&secret_region(reference)?)?;
                    Some(SecretPassword {
                        store: &store,
                        reference,
                        field,
                    })
                }
                _ => None,
            };

            let request = SignRequest::builder()
                .csr(&csr)
                .issuer_certificate(&crt_file)
                .issuer_key(&key_file)
                .bundle(bundle)
                .maybe_password_secret(password_secret)
                .maybe_deadline(timeout.map(Duration::from_secs))
                .build();

            pipeline::sign_csr(request)
        }
    }
}

fn secret_region(arn: &str) -> Result<String, Error> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() < 6 || parts[0] != "arn" || parts[2] != "secretsmanager" || parts[3].is_empty()
    {
        return Err(Error::InvalidInput(format!(
            "not a Secrets Manager ARN: {arn}"
        )));
    }
    Ok(parts[3].to_string())
}
