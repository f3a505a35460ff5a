//! Build script for libvirt-rs.
//!
//! The crate links against the system libvirt only when the `libvirt`
//! feature is enabled; the default build uses the built-in test driver
//! and needs no native library at all.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=LIBVIRT_LIB_DIR");

    // CARGO_FEATURE_<NAME> is set by cargo for every enabled feature.
    if env::var_os("CARGO_FEATURE_LIBVIRT").is_none() {
        return;
    }

    // Allow pointing at a non-standard libvirt installation.
    if let Ok(dir) = env::var("LIBVIRT_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }

    println!("cargo:rustc-link-lib=dylib=virt");
}
