//! `cargo run -p migration -- up` applies the auth schema; see `--help` for the rest.

#[tokio::main]
async fn main() {
    sea_orm_migration::cli::run_cli(migration::Migrator).await;
}
