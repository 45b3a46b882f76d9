//! Pack command

use wheelpack_core::{
    Assembler, BundleConfig, BundleError, ConfigError, ConfigLayer, ManifestError, Reporter,
};
use wheelpack_schema::Target;

use crate::PackArgs;

/// Bundle the dependencies of `args.app_path` into its packages directory.
///
/// Returns the number of files written. Target selectors are checked first,
/// before any configuration is read or the index is touched.
pub fn pack(args: &PackArgs, reporter: &impl Reporter) -> Result<usize, BundleError> {
    let platform = args
        .platform
        .as_deref()
        .ok_or(ConfigError::MissingSelector("platform"))?;
    let python_version = args
        .python_version
        .as_deref()
        .ok_or(ConfigError::MissingSelector("python-version"))?;
    let target = Target::new(platform.parse()?, python_version.parse()?);

    if args.no_deps {
        tracing::info!("Skipping dependency bundling (--no-deps)");
        return Ok(0);
    }

    if !args.app_path.is_dir() {
        return Err(ConfigError::AppPathNotFound(args.app_path.clone()).into());
    }

    let mut config = BundleConfig::load(&args.app_path, args.config.as_deref())?;
    config.apply(cli_layer(args));
    config.validate()?;

    let manifest = config.manifest_path(&args.app_path);
    if !manifest.is_file() {
        return Err(ConfigError::Manifest(ManifestError::Missing(manifest)).into());
    }

    let index = config.pip_index()?;
    let output = config.output_dir(&args.app_path);
    tracing::debug!("Packing {} for {target} into {}", manifest.display(), output.display());

    Assembler::new(index, reporter).assemble_for(&manifest, target, &output)
}

/// Whether this run is verbose once every config layer is merged: `--verbose`
/// or `verbose = true` in a config file. A config that fails to load counts
/// as not verbose; [`pack`] reports the failure.
pub fn wants_verbose(args: &PackArgs) -> bool {
    args.verbose
        || (!args.no_deps
            && args.app_path.is_dir()
            && BundleConfig::load(&args.app_path, args.config.as_deref())
                .is_ok_and(|config| config.verbose))
}

/// Flags given on the command line, as the topmost config layer.
fn cli_layer(args: &PackArgs) -> ConfigLayer {
    ConfigLayer {
        python: args.python.clone(),
        packages_dir_name: args.packages_dir_name.clone(),
        index_url: args.index_url.clone(),
        verbose: args.verbose.then_some(true),
        ..ConfigLayer::default()
    }
}
