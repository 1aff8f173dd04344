use maze_ngin::config::DEFAULT_CONFIG_PATH;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    maze_ngin::run(config_path)
}
