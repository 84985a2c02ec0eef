use std::time::Instant;

use antnet::{Error, Matrix, NetworkBuilder};

fn parse_usize(args: &[String], key: &str, default: usize) -> antnet::Result<usize> {
    let mut i = 0;
    while i + 1 < args.len() {
        if args[i] == key {
            return args[i + 1]
                .parse::<usize>()
                .map_err(|e| Error::InvalidConfig(format!("failed to parse {key}: {e}")));
        }
        i += 1;
    }
    Ok(default)
}

fn main() -> antnet::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let batch_size = parse_usize(&args, "--batch-size", 32)?;
    let iters = parse_usize(&args, "--iters", 2_000)?;
    let warmup = parse_usize(&args, "--warmup", 200)?;
    let in_dim = parse_usize(&args, "--in-dim", 24)?;
    let hidden = parse_usize(&args, "--hidden", 64)?;
    let layers = parse_usize(&args, "--layers", 2)?;
    let out_dim = parse_usize(&args, "--out-dim", 6)?;
    let seed = parse_usize(&args, "--seed", 0)? as u64;

    if batch_size == 0 || iters == 0 {
        return Err(Error::InvalidConfig(
            "batch_size and iters must be > 0".to_owned(),
        ));
    }

    let mut builder = NetworkBuilder::new(in_dim)?;
    for _ in 0..layers {
        builder = builder.add_layer(hidden)?;
    }
    let mut net = builder.add_layer(out_dim)?.build_with_seed(seed)?;

    let backend = if cfg!(feature = "matrixmultiply") {
        "matrixmultiply"
    } else {
        "naive"
    };

    // Deterministic, non-constant data.
    let inputs: Vec<f64> = (0..batch_size * in_dim)
        .map(|i| ((i % 997) as f64) * 1e-3)
        .collect();
    let targets: Vec<f64> = (0..batch_size * out_dim)
        .map(|i| if i % 3 == 0 { 1.0 } else { 0.0 })
        .collect();
    let inputs = Matrix::from_flat(inputs, batch_size, in_dim)?;
    let targets = Matrix::from_flat(targets, batch_size, out_dim)?;

    for _ in 0..warmup {
        std::hint::black_box(net.train(inputs.view(), targets.view(), 0.01)?);
    }

    let start = Instant::now();
    let mut cost = 0.0;
    for _ in 0..iters {
        cost = net.train(std::hint::black_box(inputs.view()), targets.view(), 0.01)?;
    }
    let elapsed_s = start.elapsed().as_secs_f64();

    let samples_per_s = (iters as f64) * (batch_size as f64) / elapsed_s;
    let iters_per_s = (iters as f64) / elapsed_s;
    println!(
        "antnet perf_train_batch backend={backend} batch_size={batch_size} iters={iters} warmup={warmup} in_dim={in_dim} hidden={hidden} layers={layers} out_dim={out_dim} elapsed_s={elapsed_s:.6} iters_per_s={iters_per_s:.2} samples_per_s={samples_per_s:.2} scratch={} cost={cost:.6}",
        net.scratch_capacity()
    );

    Ok(())
}
