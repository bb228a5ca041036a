fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Server and caller share one proto
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/search.proto"], &["proto"])?;

    Ok(())
}
