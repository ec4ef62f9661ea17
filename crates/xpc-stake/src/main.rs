//! xpc-stake
//!
//! Command-line access to the XPChain stake core: reward phases, interest
//! rates, stake rewards, minting odds and signed coinbase checks.
//!
//! Usage:
//!   xpc-stake phase        --height <h>
//!   xpc-stake rate         --height <h> --coin-age <blocks>
//!   xpc-stake reward       --height <h> --amount <xpc> --coin-age <blocks>
//!   xpc-stake legacy       --height <h> --amount <xpc> --age-secs <s>
//!   xpc-stake probability  --amount <xpc> --since <unix_ts> --difficulty <d> --minutes <m>
//!   xpc-stake exception    --txid <hex>
//!   xpc-stake verify-coinbase --block <path>
//!   xpc-stake keygen       [--keyfile <path>]
//!   xpc-stake sign-manifest --manifest <path> --time <t> --stake-txid <hex> --stake-vout <n>
//!                          [--keyfile <path>] [--stake-script-sig <hex>] [--sequence <n>] [--trailer <hex>]
//!   xpc-stake params
//!
//! Every command accepts `--network main|test` or `--params <json>`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use xpc_consensus::{
    build_reward_outputs, check_coinbase_reward, interest_rate, is_known_exception,
    legacy_reward, phase_of, stake_reward, MemoryChain, RewardManifest,
};
use xpc_core::transaction::{Block, OutPoint, TxIn};
use xpc_core::types::{Amount, Height, TxId};
use xpc_core::{ConsensusParams, Destination, Network, Script};
use xpc_crypto::KeyPair;
use xpc_kernel::{KernelRecord, MintProbabilityModel};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "xpc-stake",
    version,
    about = "XPChain stake tool: rewards, minting odds and coinbase checks"
)]
struct Args {
    /// Built-in consensus parameters to use.
    #[arg(long, global = true, default_value = "main")]
    network: Network,

    /// Path to consensus params JSON. Overrides --network.
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the reward phase a height falls in.
    Phase {
        #[arg(long)]
        height: Height,
    },

    /// Interest rate (hundredths of a percent) for a coin at a height.
    Rate {
        #[arg(long)]
        height: Height,
        /// Coin age in blocks.
        #[arg(long)]
        coin_age: u32,
    },

    /// Stake reward for an amount staked with the tip at `height`.
    Reward {
        #[arg(long)]
        height: Height,
        /// Amount in XPC.
        #[arg(long)]
        amount: f64,
        /// Coin age in blocks.
        #[arg(long)]
        coin_age: u32,
    },

    /// Reward under the pre-fork curve.
    Legacy {
        #[arg(long)]
        height: Height,
        /// Amount in XPC.
        #[arg(long)]
        amount: f64,
        /// Coin age in seconds.
        #[arg(long)]
        age_secs: u32,
    },

    /// Probability that an output mints within a number of minutes.
    Probability {
        /// Output value in XPC.
        #[arg(long)]
        amount: f64,
        /// Unix time the output was received.
        #[arg(long)]
        since: i64,
        /// Current stake difficulty.
        #[arg(long)]
        difficulty: f64,
        #[arg(long)]
        minutes: u32,
        /// Evaluate as of this unix time instead of now.
        #[arg(long)]
        now: Option<i64>,
    },

    /// Check whether a txid is allowed to spend an outpoint twice.
    Exception {
        /// Transaction id (hex, display order).
        #[arg(long)]
        txid: String,
    },

    /// Verify the signed reward manifest of a block (JSON).
    VerifyCoinbase {
        #[arg(long)]
        block: PathBuf,
    },

    /// Generate a staking key and save it to the keyfile.
    Keygen {
        #[arg(long, default_value = "~/.xpc/stake-key.json")]
        keyfile: PathBuf,
    },

    /// Sign a reward manifest with the keyfile's key and print the coinbase
    /// outputs that carry it.
    SignManifest {
        #[arg(long, default_value = "~/.xpc/stake-key.json")]
        keyfile: PathBuf,
        /// JSON list of `{"script": <hex>, "amount": <satoshis>}` payouts.
        #[arg(long)]
        manifest: PathBuf,
        /// Block time the signature commits to.
        #[arg(long)]
        time: u32,
        /// Outpoint spent by the coinstake (txid in display order).
        #[arg(long)]
        stake_txid: String,
        #[arg(long)]
        stake_vout: u32,
        #[arg(long, default_value = "")]
        stake_script_sig: String,
        #[arg(long, default_value_t = u32::MAX)]
        sequence: u32,
        /// Script of the zero-value trailing output.
        #[arg(long, default_value = "6a")]
        trailer: String,
    },

    /// Print the effective consensus parameters.
    Params,
}

#[derive(Serialize, Deserialize)]
struct Keyfile {
    network: Network,
    secret_key: String,
    public_key: String,
    address: Option<String>,
}

#[derive(Deserialize)]
struct ManifestEntry {
    script: String,
    amount: Amount,
}

struct StakeInput {
    txid: String,
    vout: u32,
    script_sig: String,
    sequence: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,xpc=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let params = load_params(args.params.as_deref(), args.network)?;

    match args.command {
        Command::Phase { height } => {
            let pos = phase_of(height, &params);
            print_json(&json!({
                "height": height,
                "phase": pos.phase,
                "blocks_into_phase": pos.blocks_into_phase,
            }))
        }

        Command::Rate { height, coin_age } => {
            let rate = interest_rate(height, coin_age, &params)?;
            print_json(&json!({
                "height": height,
                "coin_age": coin_age,
                "rate": rate,
                "percent": f64::from(rate) / 100.0,
            }))
        }

        Command::Reward {
            height,
            amount,
            coin_age,
        } => {
            let sats = xpc_to_sats(amount, &params)?;
            let chain = MemoryChain::new(height);
            let reward = stake_reward(sats, coin_age, &chain, &params)?;
            print_json(&json!({ "amount": sats, "reward": reward }))
        }

        Command::Legacy {
            height,
            amount,
            age_secs,
        } => {
            let sats = xpc_to_sats(amount, &params)?;
            let reward = legacy_reward(height, sats, age_secs);
            print_json(&json!({ "amount": sats, "reward": reward }))
        }

        Command::Probability {
            amount,
            since,
            difficulty,
            minutes,
            now,
        } => {
            let now = now.unwrap_or_else(|| chrono::Utc::now().timestamp());
            if since > now {
                warn!(since, now, "output received in the future; it has no weight yet");
            }
            let record = KernelRecord {
                txid: TxId::ZERO,
                vout: 0,
                time: since,
                address: None,
                amount: xpc_to_sats(amount, &params)?,
            };
            let model = MintProbabilityModel::new(record);
            let probability = model.within_minutes(difficulty, minutes, now, &params);
            print_json(&json!({
                "age_days": model.record().age_days(now),
                "minutes": minutes,
                "probability": probability,
            }))
        }

        Command::Exception { txid } => {
            let id = TxId::from_hex(&txid).context("parsing txid")?;
            print_json(&json!({ "txid": id.to_hex(), "known": is_known_exception(&id) }))
        }

        Command::VerifyCoinbase { block } => cmd_verify_coinbase(&block),

        Command::Keygen { keyfile } => cmd_keygen(&expand_tilde(&keyfile), &params),

        Command::SignManifest {
            keyfile,
            manifest,
            time,
            stake_txid,
            stake_vout,
            stake_script_sig,
            sequence,
            trailer,
        } => {
            let input = StakeInput {
                txid: stake_txid,
                vout: stake_vout,
                script_sig: stake_script_sig,
                sequence,
            };
            cmd_sign_manifest(&expand_tilde(&keyfile), &manifest, time, &input, &trailer, &params)
        }

        Command::Params => print_json(&params),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_verify_coinbase(path: &Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading block from {}", path.display()))?;
    let block: Block = serde_json::from_str(&json).context("parsing block JSON")?;

    match check_coinbase_reward(&block) {
        Ok(()) => {
            info!(time = block.time, "coinbase reward signature valid");
            print_json(&json!({ "valid": true }))
        }
        Err(e) => {
            warn!(error = %e, class = ?e.class(), "coinbase reward rejected");
            print_json(&json!({ "valid": false, "reason": e.to_string() }))
        }
    }
}

fn cmd_keygen(keyfile: &Path, params: &ConsensusParams) -> anyhow::Result<()> {
    if keyfile.exists() {
        bail!(
            "Keyfile {} already exists. Delete it first to generate a new key.",
            keyfile.display()
        );
    }
    if let Some(parent) = keyfile.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let kp = KeyPair::generate();
    let address = params.encode_destination(&Destination::KeyHash(kp.key_id()));
    let file = Keyfile {
        network: params.network,
        secret_key: hex::encode(kp.secret_bytes().as_slice()),
        public_key: hex::encode(kp.public_key().as_bytes()),
        address,
    };
    let json = serde_json::to_string_pretty(&file)?;
    write_private(keyfile, &json)
        .with_context(|| format!("writing keyfile to {}", keyfile.display()))?;

    info!(keyfile = %keyfile.display(), "generated staking key");
    println!("Public key: {}", file.public_key);
    if let Some(addr) = &file.address {
        println!("Address:    {addr}");
    }
    println!("Keyfile:    {}", keyfile.display());
    println!("\nBACK UP YOUR KEYFILE. Loss = permanent loss of staked funds.");
    Ok(())
}

fn cmd_sign_manifest(
    keyfile: &Path,
    manifest_path: &Path,
    time: u32,
    input: &StakeInput,
    trailer: &str,
    params: &ConsensusParams,
) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(keyfile)
        .with_context(|| format!("reading keyfile from {}", keyfile.display()))?;
    let file: Keyfile = serde_json::from_str(&json).context("parsing keyfile")?;
    if file.network != params.network {
        warn!(
            keyfile = %file.network,
            params = %params.network,
            "keyfile was made for another network"
        );
    }
    let secret =
        zeroize::Zeroizing::new(hex::decode(&file.secret_key).context("decoding secret key")?);
    let kp = KeyPair::from_secret_bytes(&secret)?;

    let json = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("reading manifest from {}", manifest_path.display()))?;
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(&json).context("parsing manifest JSON")?;
    let entries = entries
        .into_iter()
        .map(|e| {
            let script = hex::decode(&e.script).context("decoding payout script")?;
            Ok((Script::from_bytes(script), e.amount))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let manifest = RewardManifest::new(entries);

    let txid = TxId::from_hex(&input.txid).context("parsing stake txid")?;
    let mut stake_input = TxIn::new(OutPoint::new(txid, input.vout));
    stake_input.script_sig =
        Script::from_bytes(hex::decode(&input.script_sig).context("decoding stake script_sig")?);
    stake_input.sequence = input.sequence;

    let trailer = Script::from_bytes(hex::decode(trailer).context("decoding trailer script")?);
    let outputs = build_reward_outputs(&manifest, time, &stake_input, &kp, trailer)?;

    info!(payouts = manifest.len(), total = manifest.total(), time, "signed reward manifest");
    print_json(&json!({
        "reward_hash": manifest.signature_hash(time, &stake_input).to_hex(),
        "outputs": outputs,
    }))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Load consensus params from a JSON file, or use the built-in values for
/// `network`.
fn load_params(path: Option<&Path>, network: Network) -> anyhow::Result<ConsensusParams> {
    if let Some(p) = path {
        let json = std::fs::read_to_string(p)
            .with_context(|| format!("reading consensus params from {}", p.display()))?;
        let params: ConsensusParams =
            serde_json::from_str(&json).context("parsing consensus params JSON")?;
        params
            .validate()
            .with_context(|| format!("checking consensus params from {}", p.display()))?;
        return Ok(params);
    }
    Ok(ConsensusParams::for_network(network))
}

fn xpc_to_sats(xpc: f64, params: &ConsensusParams) -> anyhow::Result<Amount> {
    if !xpc.is_finite() || xpc < 0.0 {
        bail!("amount must be a non-negative number of XPC, got {xpc}");
    }
    Ok((xpc * params.coin as f64).round() as Amount)
}

/// Create `path` readable by the owner only. Fails if it already exists.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(contents.as_bytes())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
