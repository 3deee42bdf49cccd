use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use serde::Serialize;

use pqsigrm_recover::error::AttackResult;
use pqsigrm_recover::params::{CodeParameters, ParameterSet, RecoveryConfig};
use pqsigrm_recover::recovery::{generator_from_public_key, recover_permutation};
use pqsigrm_recover::signatures::SignatureBuffer;
use pqsigrm_recover::storage::{
    read_matched_pairs, read_permutation, read_public_key, write_matched_pairs, write_permutation,
    write_public_key, write_report, SecretKey,
};
use pqsigrm_recover::synthetic::{SyntheticInstance, SyntheticOptions};
use pqsigrm_recover::verify::{
    check_twin_structure, check_u_uv_permutation, count_good_matched_pairs,
    matched_pairs_by_agreement, TwinCheck, UuvCheck,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// JSON file with code parameters; overrides --parameter-set
    #[clap(long, global = true)]
    params: Option<PathBuf>,

    /// Built-in parameter set
    #[clap(long, value_enum, global = true, default_value = "pqsigrm-6-13")]
    parameter_set: SetArg,

    /// JSON file with recovery tunables
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for cached correlation matrices
    #[clap(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Write a JSON report of the run to this file
    #[clap(long, global = true)]
    report: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SetArg {
    #[value(name = "pqsigrm-6-13")]
    Pqsigrm613,
    #[value(name = "toy-32")]
    Toy32,
}

impl From<SetArg> for ParameterSet {
    fn from(arg: SetArg) -> Self {
        match arg {
            SetArg::Pqsigrm613 => ParameterSet::Pqsigrm613,
            SetArg::Toy32 => ParameterSet::Toy32,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recover the secret permutation from a public key and signatures
    Recover {
        /// Public key file
        #[clap(required = true)]
        public_key: PathBuf,

        /// Signature file (concatenated signed messages)
        #[clap(required = true)]
        signatures: PathBuf,

        /// Output file for the recovered permutation
        #[clap(required = true)]
        output: PathBuf,
    },
    /// Compare a recovered permutation with the secret key
    Verify {
        /// Secret key file
        #[clap(required = true)]
        secret_key: PathBuf,

        /// Recovered permutation file
        #[clap(required = true)]
        permutation: PathBuf,
    },
    /// Count how many matched pairs are true twins
    CountPairs {
        /// Secret key file
        #[clap(required = true)]
        secret_key: PathBuf,

        /// Matched pairs file, one pair per line
        #[clap(required = true)]
        pairs: PathBuf,
    },
    /// Pair every position with its most agreeing partner
    Pairs {
        /// Signature file
        #[clap(required = true)]
        signatures: PathBuf,

        /// Number of leading positions to pair (defaults to the code length)
        #[clap(long)]
        length: Option<usize>,

        /// Write the pairs here instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a synthetic instance (pk.bin, sk.bin, sigs.bin)
    Toy {
        /// Output directory
        #[clap(required = true)]
        dir: PathBuf,

        /// Number of signatures
        #[clap(long, default_value_t = 8000)]
        signatures: usize,

        /// Random seed
        #[clap(long, default_value_t = 0x5eed)]
        seed: u64,
    },
}

#[derive(Serialize)]
struct VerifyReport {
    strict: UuvCheck,
    twins: Vec<TwinCheck>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e.user_friendly_message());
            if let Some(remedy) = e.suggested_remediation() {
                error!("{}", remedy);
            }
            ExitCode::FAILURE
        }
    }
}

fn load_params(cli: &Cli) -> AttackResult<CodeParameters> {
    let params = match &cli.params {
        Some(path) => CodeParameters::from_json_file(path)?,
        None => CodeParameters::for_set(cli.parameter_set.into()),
    };
    params.validate()?;
    Ok(params)
}

fn load_config(cli: &Cli) -> AttackResult<RecoveryConfig> {
    let mut config = match &cli.config {
        Some(path) => RecoveryConfig::from_json_file(path)?,
        None => RecoveryConfig::default(),
    };
    if cli.cache_dir.is_some() {
        config.cache_dir = cli.cache_dir.clone();
    }
    Ok(config)
}

fn run(cli: &Cli) -> AttackResult<()> {
    let params = load_params(cli)?;
    match &cli.command {
        Commands::Recover {
            public_key,
            signatures,
            output,
        } => run_recover(cli, &params, public_key, signatures, output),
        Commands::Verify {
            secret_key,
            permutation,
        } => run_verify(cli, &params, secret_key, permutation),
        Commands::CountPairs { secret_key, pairs } => {
            let q = SecretKey::from_file(secret_key, &params)?.permutation()?;
            let pairs = read_matched_pairs(pairs, params.code_n)?;
            let good = count_good_matched_pairs(&q, &pairs);
            println!("{} of {} matched pairs are twins", good, pairs.len());
            Ok(())
        }
        Commands::Pairs {
            signatures,
            length,
            output,
        } => {
            let sigs = SignatureBuffer::from_file(signatures, &params)?;
            let pairs = matched_pairs_by_agreement(&sigs, length.unwrap_or(params.code_n))?;
            match output {
                Some(path) => write_matched_pairs(path, &pairs)?,
                None => {
                    for (a, b) in pairs {
                        println!("{} {}", a, b);
                    }
                }
            }
            Ok(())
        }
        Commands::Toy {
            dir,
            signatures,
            seed,
        } => run_toy(&params, dir, *signatures, *seed),
    }
}

fn run_recover(
    cli: &Cli,
    params: &CodeParameters,
    public_key: &Path,
    signatures: &Path,
    output: &Path,
) -> AttackResult<()> {
    let config = load_config(cli)?;
    let t = read_public_key(public_key, params)?;
    let sigs = SignatureBuffer::from_file(signatures, params)?;
    let generator = generator_from_public_key(&t, params)?;
    info!("Generator has {} rows over {} columns", generator.rows(), generator.cols());

    let recovery = recover_permutation(&sigs, &generator, params, &config)?;
    write_permutation(output, &recovery.secret_layout())?;
    if let Some(path) = &cli.report {
        write_report(path, &recovery.report)?;
    }
    Ok(())
}

fn run_verify(
    cli: &Cli,
    params: &CodeParameters,
    secret_key: &Path,
    permutation: &Path,
) -> AttackResult<()> {
    let q = SecretKey::from_file(secret_key, params)?.permutation()?;
    let p = read_permutation(permutation, params.code_n)?;

    let strict = check_u_uv_permutation(&q, &p)?;
    println!(
        "U|U+V split: lower half {}, upper half {}, {} of {} twins aligned",
        if strict.lower_half_ok { "ok" } else { "broken" },
        if strict.upper_half_ok { "ok" } else { "broken" },
        strict.aligned_pairs,
        strict.total_pairs
    );

    let mut twins = Vec::new();
    for block in [params.code_n / 2, params.code_n / 4] {
        let check = check_twin_structure(&q, &p, block)?;
        println!("Twins at distance {}: {} of {} aligned", block, check.aligned, check.checked);
        twins.push(check);
    }
    if !strict.passed() && twins.iter().all(TwinCheck::passed) {
        warn!("Pair structure recovered up to an orientation automorphism");
    }

    if let Some(path) = &cli.report {
        write_report(path, &VerifyReport { strict, twins })?;
    }
    Ok(())
}

fn run_toy(params: &CodeParameters, dir: &Path, signatures: usize, seed: u64) -> AttackResult<()> {
    std::fs::create_dir_all(dir)?;
    let options = SyntheticOptions {
        signatures,
        seed,
        ..SyntheticOptions::default()
    };
    let instance = SyntheticInstance::generate(params, &options)?;
    write_public_key(&dir.join("pk.bin"), &instance.public_key)?;
    write_permutation(&dir.join("sk.bin"), &instance.secret)?;
    std::fs::write(dir.join("sigs.bin"), instance.signatures.as_bytes())?;
    info!(
        "Wrote a {} instance with {} signatures to {}",
        params.code_n,
        signatures,
        dir.display()
    );
    Ok(())
}
