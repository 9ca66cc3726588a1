use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    // When TALLY_DATA_DIR is set the settings file is left alone; the env
    // override already decides where every command looks.
    let resolved = if let Ok(env_dir) = std::env::var("TALLY_DATA_DIR") {
        PathBuf::from(env_dir)
    } else {
        let mut settings = load_settings();
        if let Some(dir) = data_dir {
            settings.data_dir = shellexpand_path(&dir);
        }
        save_settings(&settings)?;
        PathBuf::from(&settings.data_dir)
    };

    std::fs::create_dir_all(&resolved)?;

    let conn = get_connection(&resolved.join("tally.db"))?;
    init_db(&conn)?;

    println!("Initialized tally at {}", resolved.display());
    Ok(())
}
