fn main() -> anyhow::Result<()> {
    schema_studio::cli::main()
}
