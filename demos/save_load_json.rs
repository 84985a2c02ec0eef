#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example save_load_json --features serde");
}

#[cfg(feature = "serde")]
fn main() -> antnet::Result<()> {
    use antnet::{Network, NetworkBuilder, TrainerConfig, TrainingSession};

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = TrainerConfig::from_json_str(r#"{ "learning_rate": 2.0, "batch_size": 4 }"#)?;
    let net = NetworkBuilder::from_sizes(&[2, 4, 1])?.build_with_seed(0)?;
    let mut session = TrainingSession::new(net, config)?;

    let xs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let ys = [0.0, 1.0, 1.0, 0.0];
    for _ in 0..2_000 {
        for (x, &y) in xs.iter().zip(&ys) {
            session.push(x, &[y])?;
        }
    }

    std::fs::create_dir_all("target")?;
    let path = "target/tmp_network.json";
    session.network().save_json(path)?;

    let loaded = Network::load_json(path)?;
    println!(
        "saved and loaded network: {path} counts={:?}",
        loaded.neuron_counts()
    );
    Ok(())
}
