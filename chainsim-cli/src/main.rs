//! Demonstration driver for the hybrid PoW/PoS consensus simulator.
//!
//! Walks the canonical scenario end to end: seed stakeholders with random
//! stakes, mine a few blocks, sample a would-be attacker coalition, run the
//! majority attack when their pooled stake clears 50%, eject them, restore
//! the chain, and mine one more block. Every random draw derives from one
//! seed, so a run can be replayed exactly with `--seed`.

use anyhow::Context;
use chainsim_consensus::{ChainConfig, ConsensusEngine, TransactionData, ValidatorId};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[derive(Parser)]
#[command(name = "chainsim")]
#[command(about = "Hybrid PoW/PoS consensus simulator")]
struct Cli {
    /// Number of stakeholders to seed
    #[arg(long, default_value_t = 10)]
    stakeholders: u32,

    /// Blocks to mine before the attack
    #[arg(long, default_value_t = 3)]
    blocks: u32,

    /// Leading zero hex digits required of each block hash
    #[arg(long, default_value_t = 4)]
    difficulty: usize,

    /// Seed driving all randomness; omitted means a fresh random run
    #[arg(long)]
    seed: Option<u64>,

    /// Smallest initial stake handed out
    #[arg(long, default_value_t = 10)]
    min_stake: u64,

    /// Largest initial stake handed out
    #[arg(long, default_value_t = 100)]
    max_stake: u64,

    /// Smallest attacker coalition sampled
    #[arg(long, default_value_t = 4)]
    min_attackers: usize,

    /// Largest attacker coalition sampled
    #[arg(long, default_value_t = 6)]
    max_attackers: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    anyhow::ensure!(
        cli.min_stake <= cli.max_stake,
        "--min-stake must not exceed --max-stake"
    );

    let seed = cli.seed.unwrap_or_else(|| rand::thread_rng().gen());
    println!("Running simulation with seed {seed}");

    let mut driver_rng = StdRng::seed_from_u64(seed);
    let engine_rng = StdRng::from_rng(&mut driver_rng).context("deriving engine RNG")?;

    run_simulation(&cli, engine_rng, &mut driver_rng)
}

fn run_simulation(cli: &Cli, engine_rng: StdRng, rng: &mut StdRng) -> anyhow::Result<()> {
    let config = ChainConfig {
        difficulty: cli.difficulty,
        max_mining_attempts: None,
    };
    let mut engine = ConsensusEngine::with_rng(engine_rng, config)?;

    for i in 1..=cli.stakeholders {
        let stake = rng.gen_range(cli.min_stake..=cli.max_stake);
        engine.register_stakeholder(format!("Miner_{i}"), stake)?;
    }

    println!("\nInitial Stakeholders:");
    for (id, stake) in engine.registry().stakeholders() {
        println!("{id}: {stake} coins");
    }

    for i in 1..=cli.blocks {
        println!("\n--- Mining Block {i} ---");
        let data = TransactionData::encode(&format!("Transaction Data for Block {i}"))?;
        let validator = engine.append_block(data)?;
        println!("Block {i} was validated by {validator}");
    }

    println!(
        "\nBlockchain valid before attack: {}",
        engine.is_chain_valid()
    );

    let attackers = sample_attackers(cli, &engine, rng);
    let pooled = engine.registry().pooled_stake(&attackers);
    let total = engine.registry().total_stake();
    println!("\nSelected malicious miners: {attackers:?}");
    println!("Pooled stake: {pooled} coins (Total stake: {total} coins)");

    if engine.registry().has_majority(&attackers) {
        println!("\n--- Pooled stake is a majority, simulating 51% attack ---");
        if engine.simulate_attack(&attackers)? {
            println!(
                "Malicious block replaced the tip: {}",
                engine.chain().tip().hash
            );
        } else {
            println!("Malicious attempt failed to meet the difficulty criteria.");
        }

        engine.eject(&attackers);
        println!(
            "\nBlockchain valid after ejecting malicious miners: {}",
            engine.is_chain_valid()
        );

        if engine.restore() {
            println!("Blockchain successfully restored.");
        }

        println!("\n--- Re-mining Block after restoration ---");
        let data = TransactionData::encode(&"New Transaction Data after Restoration")?;
        let validator = engine.append_block(data)?;
        println!("New Block was validated by {validator}");
    } else {
        println!("\n--- Pooled stake is not a majority, no attack simulated ---");
    }

    print_chain(&engine);
    Ok(())
}

/// Draw a random coalition of registered stakeholders, bounded by the
/// configured coalition size and by how many stakeholders exist.
fn sample_attackers<R: Rng>(
    cli: &Cli,
    engine: &ConsensusEngine<R>,
    rng: &mut StdRng,
) -> Vec<ValidatorId> {
    let ids: Vec<ValidatorId> = engine
        .registry()
        .stakeholders()
        .map(|(id, _)| id.clone())
        .collect();

    let upper = cli.max_attackers.min(ids.len());
    let lower = cli.min_attackers.min(upper);
    let size = rng.gen_range(lower..=upper);

    ids.choose_multiple(rng, size).cloned().collect()
}

fn print_chain<R: Rng>(engine: &ConsensusEngine<R>) {
    println!("\n-------- Blockchain --------");
    for block in engine.chain().blocks() {
        println!("Block {} {}", block.index, block.hash);
        println!("Timestamp: {}", block.timestamp);
        println!("Transactions: {}", block.transactions);
        println!("Previous Hash: {}", block.previous_hash);
        println!("Nonce: {}\n", block.nonce);
    }
}
