use schedsim_core::SimConfig;

pub fn run(config: &SimConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
