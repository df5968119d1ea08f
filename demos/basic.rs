use {
    snowflake::IdGenerator,
    std::error::Error,
    tracing_subscriber::EnvFilter,
};

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let generator = IdGenerator::with_config(1, 1, 0, 5, 5, 12)?;
    let id = generator.next_id();

    println!("Generated ID: {}", id);
    println!("Worker ID: {}", generator.decode_worker_id(id));
    println!("Datacenter ID: {}", generator.decode_datacenter_id(id));
    println!("Timestamp: {}", generator.decode_timestamp(id));
    Ok(())
}
