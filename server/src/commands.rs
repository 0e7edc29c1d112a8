use clap::Subcommand;
use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;

#[derive(Subcommand, Default)]
pub(crate) enum Command {
    /// Apply pending migrations, then serve the HTTP API
    #[default]
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

impl Command {
    pub(crate) async fn run(&self) -> Result<()> {
        match &self {
            Command::Serve => crate::http_server::cmd::serve().await,
            Command::Migrate => migrate().await,
        }
    }
}

async fn migrate() -> Result<()> {
    // The pool constructor migrates on connect.
    let pool = db::setup_db_pool()
        .await
        .wrap_err("Failed to migrate the database")?;
    pool.close().await;

    tracing::info!("Migrations applied");

    Ok(())
}
