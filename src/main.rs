//! Physics Shell entry point
//!
//! On the web this only sets up logging; the page constructs a
//! `SoundBridge`. Natively it checks a sound catalog file.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    log::info!("Physics Shell starting...");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let path = std::env::args().nth(1);
    match check_catalog(path.as_deref()) {
        Ok(()) => {}
        Err(e) => {
            log::error!("{}", e);
            eprintln!("catalog invalid: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load, validate and summarize a catalog (builtin when no path is given)
#[cfg(not(target_arch = "wasm32"))]
fn check_catalog(path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    use physics_shell::SoundCatalog;

    let catalog = match path {
        Some(path) => {
            log::info!("Checking catalog {}", path);
            SoundCatalog::from_json(&std::fs::read_to_string(path)?)?
        }
        None => {
            log::info!("Checking builtin catalog");
            let catalog = SoundCatalog::builtin();
            catalog.validate()?;
            catalog
        }
    };

    println!("{} sounds:", catalog.len());
    for d in catalog.descriptors() {
        println!("  {:<14} vol {:<4} {}", d.id, d.default_volume, d.source);
    }
    for (family, members) in catalog.groups() {
        println!("  family {} -> {}", family, members.join(", "));
    }
    println!("✓ Catalog valid");
    Ok(())
}
