use std::path::Path;

use super::{InputArgs, dry_deployment};
use crate::output;

/// Write every artifact of a run beneath `out`, mirroring host paths.
///
/// Secrets are generated in memory; the secret store is not touched.
pub fn render(args: &InputArgs, out: &Path) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let inputs = args.resolve()?;
    let deployment = dry_deployment(config, &inputs, None)?;

    let artifacts = hoist_render::all(&deployment)?;
    let written = hoist_render::write_tree(out, &artifacts)?;
    for path in &written {
        println!("  {}", path.display());
    }
    output::ok(format!(
        "wrote {} file(s) to {}",
        written.len(),
        out.display()
    ));
    Ok(())
}
