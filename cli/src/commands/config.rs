//! Config commands

use super::Outcome;
use crate::config::Config;
use crate::ConfigCommands;

pub async fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<Outcome, String> {
    match action {
        ConfigCommands::Init => {
            let config = Config::default();
            let path = config.save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            config.set(&key, &value)?;
            config.save(profile)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Show => {
            let config = Config::load(profile)?;
            let text = toml::to_string_pretty(&config).map_err(|e| e.to_string())?;
            println!("{}", text);
        }
    }
    Ok(Outcome::Success)
}
