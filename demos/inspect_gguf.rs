//! Prints a GGUF file's architecture hint and tensor manifest.
//!
//! Not a workspace member; copy next to a `Cargo.toml` that depends on
//! `smallmind` with the `gguf` and `import` features to run it.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder().parse_default_env().init();

    let path = std::env::args().nth(1).expect("usage: inspect_gguf <model.gguf>");
    let reader = smallmind::gguf::StreamReader::open(&path)?;
    let info = reader.info();

    let hint = smallmind::import::ModelArchitectureHint::extract(info.metadata());
    println!("architecture: {:?}", hint.architecture);
    println!("embedding_length: {:?}", hint.embedding_length);
    println!("block_count: {:?}", hint.block_count);
    println!();

    for tensor in info.tensors() {
        println!(
            "{:<32} {:?} dims={:?}",
            tensor.name(),
            tensor.element_kind(),
            tensor.dims()
        );
    }

    Ok(())
}
