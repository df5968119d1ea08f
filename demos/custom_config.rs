use {
    snowflake::IdGenerator,
    std::error::Error,
    tracing_subscriber::EnvFilter,
};

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("debug"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let epoch: u64 = 1609459200000; // 2021-01-01 00:00:00.000 UTC
    let generator = IdGenerator::builder()
        .with_datacenter_id_bits(3)
        .with_worker_id_bits(7)
        .with_sequence_bits(10)
        .with_datacenter_id(5)
        .with_worker_id(100)
        .with_epoch(epoch)
        .build()?;

    let id = generator.next_id();
    println!("Snowflake ID: {}", id);
    println!("Parts: {:?}", generator.decompose(id));
    Ok(())
}
