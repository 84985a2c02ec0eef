use antnet::{Init, NetworkBuilder, TrainerConfig, TrainingSession};

fn main() -> antnet::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Classic XOR, streamed one example at a time like agents reporting each tick.
    let xs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let ys = [0.0, 1.0, 1.0, 0.0];

    let net = NetworkBuilder::from_sizes(&[2, 4, 1])?
        .weight_init(Init::Uniform {
            min: -1.0,
            max: 1.0,
        })
        .build_with_seed(0)?;
    println!("{net}");

    let config = TrainerConfig {
        learning_rate: 5.0,
        learning_rate_decay: 0.999_99,
        learning_rate_min: 0.5,
        batch_size: 4,
        log_every_examples: 20_000,
    };
    let mut session = TrainingSession::new(net, config)?;
    for _ in 0..20_000 {
        for (x, &y) in xs.iter().zip(&ys) {
            session.push(x, &[y])?;
        }
    }
    println!(
        "epochs={} last_cost={:?} learning_rate={:.4}",
        session.epoch(),
        session.last_cost(),
        session.learning_rate()
    );

    for x in &xs {
        let y = session.predict(x)?;
        println!("x={x:?} y={:.4}", y[0]);
    }
    Ok(())
}
