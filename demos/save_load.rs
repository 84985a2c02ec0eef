use antnet::{Network, NetworkBuilder};

fn main() -> antnet::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let mut net = NetworkBuilder::from_sizes(&[3, 5, 2])?.build_with_seed(0)?;
    for i in 0..100 {
        let t = i as f64 / 100.0;
        net.train_one(&[t, 1.0 - t, 0.5], &[t, 1.0 - t], 0.5)?;
    }

    std::fs::create_dir_all("target")?;
    let path = "target/tmp_network.bin";
    net.save(path)?;

    let mut loaded = Network::load(path)?;
    let x = [0.2, 0.8, 0.5];
    let a = net.run(&x)?.to_vec();
    let b = loaded.run(&x)?.to_vec();
    println!("saved and loaded network: {path}");
    println!("original={a:?} loaded={b:?} identical={}", a == b);
    Ok(())
}
