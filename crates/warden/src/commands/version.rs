pub fn run() -> anyhow::Result<()> {
    println!("warden {}", env!("CARGO_PKG_VERSION"));
    println!("Orchestration middleware for parallel AI agents");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        assert!(run().is_ok());
    }
}
