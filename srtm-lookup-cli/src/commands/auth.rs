use anyhow::{bail, Result};
use srtm_lookup::encode_credential;

pub fn run(user: &str, password: &str) -> Result<()> {
    if user.is_empty() || password.is_empty() {
        bail!("User and password must not be empty");
    }

    println!("{}", encode_credential(user, password));
    eprintln!("Pass it with --auth or set SRTM_EARTHDATA_AUTH.");
    Ok(())
}
