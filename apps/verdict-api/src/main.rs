use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = verdict_api::Args::parse();
	verdict_api::run(args).await
}
