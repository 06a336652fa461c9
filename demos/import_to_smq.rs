//! Converts a GGUF file into the private SMQ container and registers the
//! result in the local model cache.
//!
//! Not a workspace member; copy next to a `Cargo.toml` that depends on
//! `smallmind` with the `import` and `cache` features to run it.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder().parse_default_env().init();

    let mut args = std::env::args().skip(1);
    let gguf_path = args.next().expect("usage: import_to_smq <model.gguf> <out.smq>");
    let smq_path = args.next().expect("usage: import_to_smq <model.gguf> <out.smq>");

    smallmind::import::import(&gguf_path, &smq_path)?;

    let cache = smallmind::cache::ModelCache::from_env();
    let id = cache.register(&smq_path, None, None)?;
    println!("imported {gguf_path} -> {smq_path}, registered as {id:?}");

    let report = cache.verify(&id)?;
    println!("verify: valid={}", report.valid);

    Ok(())
}
