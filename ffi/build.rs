use std::env;
use std::fs::File;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let (Ok(crate_dir), Ok(out_dir)) = (env::var("CARGO_MANIFEST_DIR"), env::var("OUT_DIR")) else {
        println!("cargo:warning=CARGO_MANIFEST_DIR or OUT_DIR unset; skipping tmdb_auth.h");
        return;
    };
    let out = PathBuf::from(out_dir).join("tmdb_auth.h");

    // Header generation never fails the build; the Rust library is still usable.
    let bindings = match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("TMDB_AUTH_H")
        .generate()
    {
        Ok(bindings) => bindings,
        Err(e) => {
            println!("cargo:warning=cbindgen failed: {e}");
            return;
        }
    };
    match File::create(&out) {
        Ok(file) => {
            bindings.write(file);
            println!("cargo:rustc-env=TMDB_AUTH_HEADER={}", out.display());
        }
        Err(e) => println!("cargo:warning=cannot write {}: {e}", out.display()),
    }
}
