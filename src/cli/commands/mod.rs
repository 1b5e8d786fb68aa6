use anyhow::Result;

pub mod build;
pub mod new;

pub use build::BuildCommand;
pub use new::NewCommand;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
