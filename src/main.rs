//! # Voxel World Demo Entry Point
//!
//! Runs the headless streaming demo. An optional argument names a JSON
//! configuration file.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- config.json
//! ```

fn main() {
    if let Err(error) = voxel_world::run() {
        log::error!("{}", error);
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
