use crate::error::{LiquidError, LiquidResult};
use crate::external::CargoClient;

/// Ensures the active toolchain can run `-Z build-std`.
pub async fn check_channel(cargo: &CargoClient) -> LiquidResult<()> {
    let release = cargo.rustc_release().await?;
    tracing::debug!(%release, "detected toolchain release");
    if is_unstable_release(&release) {
        Ok(())
    } else {
        Err(LiquidError::UnsupportedChannel { release })
    }
}

fn is_unstable_release(release: &str) -> bool {
    release.contains("nightly") || release.contains("dev")
}
