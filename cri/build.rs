//! Build script for cri-envcheck
//!
//! Compiles the CRI v1 proto subset.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Client for the runtime; server stubs back the integration tests
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile(&["proto/api.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/api.proto");

    Ok(())
}
