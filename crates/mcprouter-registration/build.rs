fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Client codegen backs the `mcprouter admin` CLI subcommands.
    tonic_build::configure().compile_protos(&["proto/registration.proto"], &["proto"])?;
    Ok(())
}
