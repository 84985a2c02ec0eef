use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use antnet::init::{decode, encode};
use antnet::{BackgroundConfig, BackgroundTrainer, NetworkBuilder, TrainerConfig, TrainingSession};

/// Toy foraging policy: head straight for the food.
fn desired_heading(food_dx: f64, food_dy: f64) -> [f64; 2] {
    let len = (food_dx * food_dx + food_dy * food_dy).sqrt().max(1e-9);
    [encode(food_dx / len), encode(food_dy / len)]
}

fn main() -> antnet::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let net = NetworkBuilder::from_sizes(&[2, 12, 2])?.build_with_seed(1)?;
    let config = TrainerConfig {
        learning_rate: 2.0,
        learning_rate_min: 0.05,
        batch_size: 64,
        log_every_examples: 200_000,
        ..TrainerConfig::default()
    };
    let session = TrainingSession::new(net, config)?;

    let mut rng = StdRng::seed_from_u64(7);
    let trainer = BackgroundTrainer::spawn(session, BackgroundConfig::default(), move |s| {
        // One simulated tick: every ant reports where the food is and what it should do.
        for _ in 0..64 {
            let dx = rng.gen_range(-1.0..1.0);
            let dy = rng.gen_range(-1.0..1.0);
            s.push(&[encode(dx), encode(dy)], &desired_heading(dx, dy))?;
        }
        Ok(())
    })?;

    // Foreground "render loop": pick up fresh networks as they arrive.
    for frame in 0..20 {
        std::thread::sleep(Duration::from_millis(50));
        if let Some(mut snapshot) = trainer.take_snapshot() {
            let y = snapshot.run(&[encode(1.0), encode(0.0)])?;
            println!(
                "frame={frame} snapshots={} heading=({:.3}, {:.3})",
                trainer.snapshots_published(),
                decode(y[0]),
                decode(y[1])
            );
        }
    }

    let session = trainer.stop()?;
    println!(
        "stopped after {} epochs, lr={:.4}, last_cost={:?}",
        session.epoch(),
        session.learning_rate(),
        session.last_cost()
    );
    Ok(())
}
