//! Link the QSPI flash driver and mega65-libc.
//!
//! Both are C libraries built with llvm-mos.  Point `MEGA65_LIB_DIR` at the
//! directory holding `libqspiflash.a` and `libmega65.a`.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=MEGA65_LIB_DIR");
    if let Ok(dir) = env::var("MEGA65_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }
    println!("cargo:rustc-link-lib=static=qspiflash");
    println!("cargo:rustc-link-lib=static=mega65");
}
