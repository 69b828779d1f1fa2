//! Config subcommands handler

use anyhow::{bail, Result};

use kline::Config;

/// Show the effective configuration as TOML.
#[cfg(not(tarpaulin_include))]
pub fn handle_show() -> Result<()> {
    let config = Config::load()?;
    let toml_str = toml::to_string_pretty(&config)?;
    print!("{}", toml_str);
    Ok(())
}

/// Print the config file location.
#[cfg(not(tarpaulin_include))]
pub fn handle_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

/// Write a default config file.
///
/// Refuses to overwrite an existing file unless `force` is set.
#[cfg(not(tarpaulin_include))]
pub fn handle_init(force: bool) -> Result<()> {
    let path = Config::config_path()?;
    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save()?;
    println!("Wrote {}", path.display());
    Ok(())
}
