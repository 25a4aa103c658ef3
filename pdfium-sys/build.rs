use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PDFIUM_LIB_DIR");

    // Without the `link` feature only the ABI types are compiled and nothing
    // needs to be found on the system.
    if env::var_os("CARGO_FEATURE_LINK").is_none() {
        return;
    }

    let target = env::var("TARGET").unwrap();

    // Priority 1: Manual override via PDFIUM_LIB_DIR
    if let Ok(lib_dir) = env::var("PDFIUM_LIB_DIR") {
        println!("cargo:warning=Using PDFIUM_LIB_DIR: {}", lib_dir);
        setup_linking(&PathBuf::from(&lib_dir), &target);
        return;
    }

    // Priority 2: whatever the system linker finds
    println!("cargo:rustc-link-lib=dylib=pdfium");
}

fn setup_linking(lib_dir: &PathBuf, target: &str) {
    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=dylib=pdfium");

    // Add rpath for runtime library discovery (macOS/Linux)
    if target.contains("apple") || target.contains("linux") {
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir.display());
    }
}
