fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // Pass through REVIEW_GATE_GIT_HASH from hermetic build environments without a .git
    println!("cargo:rerun-if-env-changed=REVIEW_GATE_GIT_HASH");
    if let Ok(hash) = std::env::var("REVIEW_GATE_GIT_HASH") {
        println!("cargo:rustc-env=REVIEW_GATE_GIT_HASH={}", hash);
    }
}
