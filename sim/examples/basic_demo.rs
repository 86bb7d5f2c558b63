//! Basic demonstration of the garrison simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set `RUST_LOG=garrison_sim=debug` to watch the AI plan.

use garrison_sim::SimWorld;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("garrison_sim=info")))
        .init();

    println!("=== Garrison Sim - Skirmish Demo ===\n");

    let mut sim = SimWorld::new_skirmish();

    println!("Initial state:");
    print_snapshot(&mut sim);

    // Player1 sends its home wave at the central factory
    println!("\n--- Player1 attacks the central factory ---\n");
    if let Err(err) = sim.order_attack(0, 6) {
        eprintln!("order rejected: {err}");
    }

    // 20 seconds at 30 ticks/sec
    println!("Running simulation for 600 ticks...\n");
    for tick in 0..600 {
        sim.tick_once();

        if (tick + 1) % 60 == 0 {
            println!("--- Tick {} (t={:.1}s) ---", sim.current_tick(), sim.current_time());
            print_snapshot(&mut sim);
        }
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize snapshot: {err}"),
    }
}

fn print_snapshot(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();

    println!(
        "  AI strategy: {}  live drones: P1={} P2={}  in flight: {}",
        snapshot.strategy,
        snapshot.live_drones.player1,
        snapshot.live_drones.player2,
        snapshot.drones.len()
    );
    for garrison in &snapshot.garrisons {
        println!(
            "    Garrison {:>2} {:<10} {:<7}: pos=({:>6.1}, {:>6.1}) drones={:>3} shield={:.1}/{:.1}",
            garrison.id,
            garrison.kind,
            garrison.faction,
            garrison.x,
            garrison.y,
            garrison.drones,
            garrison.shield,
            garrison.shield_max
        );
    }
}
