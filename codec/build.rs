use std::env;

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=./build.rs");
    println!("cargo:rerun-if-env-changed=OPUS_LIB_DIR");

    // Nothing is linked unless the crate is built against the system engine.
    if env::var_os("CARGO_FEATURE_LIBOPUS").is_none() {
        return Ok(());
    }

    if let Some(dir) = env::var_os("OPUS_LIB_DIR") {
        println!(
            "cargo:rustc-link-search=all={}",
            dir.to_str()
                .ok_or_else(|| anyhow::anyhow!("Failed to path into string."))?
        );

        println!("cargo:rustc-link-lib=opus");
        return Ok(());
    }

    // pkg-config emits the link directives itself when it finds the library.
    if let Err(e) = pkg_config::Config::new()
        .atleast_version("1.1")
        .probe("opus")
    {
        println!("cargo:warning=pkg-config could not find opus ({}), falling back to -lopus", e);
        println!("cargo:rustc-link-lib=opus");
    }

    Ok(())
}
