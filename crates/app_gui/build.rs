use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=LEAF_APP_VERSION");
    let version = env::var("LEAF_APP_VERSION")
        .or_else(|_| env::var("CARGO_PKG_VERSION"))
        .unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env=LEAF_APP_VERSION={version}");
}
