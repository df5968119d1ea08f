use {
    snowflake::IdGenerator,
    std::{collections::HashSet, error::Error, sync::{mpsc, Arc}, thread},
    tracing_subscriber::EnvFilter,
};

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let generator = Arc::new(IdGenerator::new(1, 1)?);
    let (tx, rx) = mpsc::channel();

    for _ in 0 .. 10 {
        let generator = Arc::clone(&generator);
        let tx = tx.clone();

        thread::spawn(move || {
            for _ in 0 .. 100 {
                let _ = tx.send(generator.next_id());
            }
        });
    }
    drop(tx);

    let ids: HashSet<u64> = rx.iter().collect();
    println!("Generated {} unique IDs", ids.len());
    assert_eq!(ids.len(), 1000);

    Ok(())
}
