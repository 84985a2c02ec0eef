use std::path::PathBuf;

use antnet::{Error, Network, NetworkBuilder};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("antnet-{}-{name}", std::process::id()))
}

fn trained() -> Network {
    let mut net = NetworkBuilder::from_sizes(&[4, 6, 5, 3])
        .unwrap()
        .build_with_seed(21)
        .unwrap();
    for i in 0..10 {
        let x = [0.1 * i as f64, 0.2, 0.3, 0.4];
        net.train_one(&x, &[1.0, 0.0, 0.5], 0.3).unwrap();
    }
    net
}

#[test]
fn save_and_load_roundtrip_exactly() {
    let net = trained();
    let path = temp_path("roundtrip.bin");
    net.save(&path).unwrap();

    let mut loaded = Network::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.neuron_counts(), net.neuron_counts());
    assert_eq!(loaded.weights(), net.weights());
    assert_eq!(loaded.biases(), net.biases());

    let mut original = net.clone();
    let x = [0.9, 0.1, 0.5, 0.7];
    assert_eq!(loaded.run(&x).unwrap(), original.run(&x).unwrap());
}

#[test]
fn file_size_matches_layout() {
    let net = trained();
    let path = temp_path("size.bin");
    net.save(&path).unwrap();
    let len = std::fs::metadata(&path).unwrap().len() as usize;
    std::fs::remove_file(&path).unwrap();

    let t = net.topology();
    let expected = 4 * (3 + t.neuron_counts().len()) + 8 * (t.total_weights() + t.total_neurons());
    assert_eq!(len, expected);
}

#[test]
fn loading_missing_or_truncated_file_fails() {
    assert!(matches!(
        Network::load(temp_path("does-not-exist.bin")),
        Err(Error::Io(_))
    ));

    let net = trained();
    let mut bytes = Vec::new();
    net.write_to(&mut bytes).unwrap();
    let path = temp_path("truncated.bin");
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let result = Network::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(Error::Io(_))));
}

#[cfg(feature = "serde")]
#[test]
fn json_roundtrip_through_file() {
    let net = trained();
    let path = temp_path("roundtrip.json");
    net.save_json(&path).unwrap();
    let loaded = Network::load_json(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.neuron_counts(), net.neuron_counts());
    assert_eq!(loaded.weights(), net.weights());
    assert_eq!(loaded.biases(), net.biases());
}
