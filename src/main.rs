use env_logger::Env;
use miette::Result;
use release_notify::run;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    run().await
}
