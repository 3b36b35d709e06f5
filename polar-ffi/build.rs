use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");

    let (Ok(crate_dir), Ok(out_dir)) = (env::var("CARGO_MANIFEST_DIR"), env::var("OUT_DIR")) else {
        return;
    };

    let result = cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("POLAR_RECORDER_H")
        .generate();

    // Header generation is best effort; the library builds without it
    match result {
        Ok(bindings) => {
            bindings.write_to_file(PathBuf::from(out_dir).join("polar_recorder.h"));
        }
        Err(e) => println!("cargo:warning=skipping C header: {}", e),
    }
}
