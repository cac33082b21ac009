// Shared build script helper for README-to-rustdoc embedding.
// Include with: include!("../build_common.rs");
//
// The including file must import std::env, std::fs, and std::path::Path.

/// Copy the crate README into `OUT_DIR` so `lib.rs` can embed it as crate
/// docs, rewriting source links (`src/foo.rs`) into rustdoc module links.
fn embed_readme(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");

    let readme = Path::new(crate_dir).join("README.md");
    let content = fs::read_to_string(&readme).unwrap_or_default();

    let rustdoc_content = content.replace("](src/", "](").replace(".rs)", ")");

    let out_dir = env::var("OUT_DIR").unwrap();
    fs::write(Path::new(&out_dir).join("README_GENERATED.md"), rustdoc_content).unwrap();
}
