use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
mod auth;
use scryptbox::{DEFAULT_SALT_LEN, DEFAULT_TIMEOUT_MS, SealOptions, Sealer, crypto::KEY_LEN};

#[derive(Debug, clap::Args)]
struct CalibrationArgs {
    /// Time budget for choosing the scrypt cost, in milliseconds
    #[arg(
        long = "timeout-ms",
        env = "SCRYPTBOX_TIMEOUT_MS",
        default_value_t = DEFAULT_TIMEOUT_MS
    )]
    timeout_ms: u64,

    /// Salt length in bytes (at least 24; the salt prefix is the nonce)
    #[arg(long = "salt-len", default_value_t = DEFAULT_SALT_LEN)]
    salt_len: usize,
}

impl CalibrationArgs {
    fn to_seal_options(&self) -> Result<SealOptions> {
        Ok(SealOptions::new(
            self.salt_len,
            KEY_LEN,
            Duration::from_millis(self.timeout_ms),
        )?)
    }
}

#[derive(Debug, Parser)]
#[command(name = "scryptbox")]
#[command(
    version,
    about = "Seal files under a passphrase with self-calibrating scrypt."
)]
struct Cli {
    /// Log filter, e.g. "debug" or "scryptbox=debug"
    #[arg(long, global = true, env = "SCRYPTBOX_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seals a file into an envelope
    #[command(arg_required_else_help = true)]
    Seal {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        calibration: CalibrationArgs,
    },

    /// Opens an envelope, writing the plaintext to OUTPUT or stdout
    #[command(arg_required_else_help = true)]
    Open {
        input: PathBuf,
        output: Option<PathBuf>,
    },

    /// Prints the public header of an envelope
    #[command(arg_required_else_help = true)]
    Inspect { input: PathBuf },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match args.command {
        Commands::Seal {
            input,
            output,
            calibration,
        } => {
            let options = calibration.to_seal_options()?;
            let plaintext = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let password = auth::read_new_password_with_confirmation()?;

            let sealer = Sealer::new(options);
            let kdf = sealer.seal_file(password.as_bytes(), &plaintext, &output)?;
            println!("sealed {} (log_n={})", output.display(), kdf.log_n());
        }
        Commands::Open { input, output } => {
            let password = auth::read_password()?;
            let (_, plaintext) = scryptbox::open_file(password.as_bytes(), &input)?;

            match output {
                Some(path) => {
                    scryptbox::storage::write_atomic(&path, &plaintext)?;
                    println!("opened {}", path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&plaintext)?;
                    stdout.flush()?;
                }
            }
        }
        Commands::Inspect { input } => {
            let data = scryptbox::storage::read(&input)?;
            let header = scryptbox::inspect(&data)?;
            println!("{header}");
        }
    }

    Ok(())
}
