use anyhow::Result;

fn main() -> Result<()> {
    let args = vfo::cli::parse();
    vfo::app::run(args)
}
