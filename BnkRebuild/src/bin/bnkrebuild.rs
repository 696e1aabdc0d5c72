fn main() -> anyhow::Result<()> {
    bnkrebuild::cli::run_cli()
}
