use anyhow::Result;
use fs_extra::{copy_items, dir::CopyOptions};
use std::{env, path::PathBuf};

/// Mirrors `assets/` (textures, crystal model) into `OUT_DIR` for the asset resolver.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        println!("cargo:warning=no assets directory, textures and models must be supplied at runtime");
        return Ok(());
    }

    let mut options = CopyOptions::new();
    options.overwrite = true;
    copy_items(&[assets], env::var("OUT_DIR")?, &options)?;
    Ok(())
}
