use anyhow::{Context, Result};
use mocap_convert::config::Config;
use std::path::Path;

#[test]
fn load_example_configs() -> Result<()> {
    let mut count = 0;
    glob::glob(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("config")
            .join("*.json5")
            .to_str()
            .unwrap(),
    )?
    .try_for_each(|path| -> Result<_> {
        let path = path?;
        let _config =
            Config::open(&path).with_context(|| format!("failed to parse {}", path.display()))?;
        count += 1;
        Ok(())
    })?;

    assert_eq!(count, 2);
    Ok(())
}
