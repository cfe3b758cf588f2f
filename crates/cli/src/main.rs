//! kusk-gen CLI
//!
//! Generates Kubernetes ingress and service-mesh manifests from an OpenAPI 3
//! or Swagger 2 description. One subcommand per registered generator.

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use colored::*;
use kusk_gen_common::OptionsResolver;
use kusk_gen_generator::{
    flags_to_value, AmbassadorGenerator, AmbassadorV2Generator, FlagKind, FlagSpec, FlagValue,
    Generator, GeneratorRegistry, LinkerdGenerator, NginxIngressGenerator, TraefikGenerator,
};
use kusk_gen_parser::get_options;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Overrides the log filter, e.g. `KUSK_LOG=kusk_gen_generator=trace`
const LOG_ENV: &str = "KUSK_LOG";

const AFTER_HELP: &str = "EXAMPLES:\n  \
    # Ambassador Mappings for the petstore service\n  \
    kusk-gen ambassador \\\n    \
    --in petstore.yaml \\\n    \
    --service.name petstore \\\n    \
    --service.namespace default\n\n  \
    # Traefik objects under a base path, written to a file\n  \
    kusk-gen traefik \\\n    \
    --in petstore.yaml \\\n    \
    --service.name petstore \\\n    \
    --path.base /petstore/api/v3 \\\n    \
    --path.trim_prefix /petstore \\\n    \
    --output petstore-traefik.yaml";

fn main() -> ExitCode {
    let registry = match builtin_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let matches = cli(&registry).get_matches();
    init_tracing(matches.get_flag("verbose"));

    match run(&registry, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn builtin_registry() -> Result<GeneratorRegistry> {
    let mut registry = GeneratorRegistry::new();
    registry.register(Box::new(
        AmbassadorGenerator::new().context("failed to load Ambassador templates")?,
    ));
    registry.register(Box::new(
        AmbassadorV2Generator::new().context("failed to load Ambassador templates")?,
    ));
    registry.register(Box::new(LinkerdGenerator));
    registry.register(Box::new(NginxIngressGenerator));
    registry.register(Box::new(TraefikGenerator));
    Ok(registry)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    // stdout carries the manifests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn cli(registry: &GeneratorRegistry) -> Command {
    let mut command = Command::new("kusk-gen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate Kubernetes manifests from OpenAPI and Swagger specs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .after_help(AFTER_HELP)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable verbose output"),
        );

    for generator in registry.iter() {
        command = command.subcommand(generator_command(generator));
    }
    command
}

fn generator_command(generator: &dyn Generator) -> Command {
    let mut command = Command::new(generator.cmd())
        .about(generator.short_description())
        .long_about(generator.long_description())
        .arg(
            Arg::new("in")
                .short('i')
                .long("in")
                .value_name("PATH")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to the OpenAPI or Swagger spec"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Write manifests to this file instead of stdout"),
        );

    for flag in generator.flags() {
        command = command.arg(flag_arg(&flag));
    }
    command
}

fn flag_arg(flag: &FlagSpec) -> Arg {
    let arg = Arg::new(flag.name).long(flag.name).help(flag.help);
    match flag.kind {
        FlagKind::String => arg.value_name("STRING"),
        FlagKind::Integer => arg.value_name("INT").value_parser(value_parser!(u64)),
        // bare `--path.split` means true, `--path.split=false` is accepted too
        FlagKind::Boolean => arg
            .value_name("BOOL")
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_parser(BoolishValueParser::new()),
        FlagKind::StringList => arg
            .value_name("LIST")
            .value_delimiter(',')
            .action(ArgAction::Append),
    }
}

/// Flags the user actually passed, as a nested options layer
fn collect_flags(generator: &dyn Generator, matches: &ArgMatches) -> Value {
    let values = generator.flags().into_iter().filter_map(|flag| {
        if matches.value_source(flag.name) != Some(ValueSource::CommandLine) {
            return None;
        }
        let value = match flag.kind {
            FlagKind::String => FlagValue::String(matches.get_one::<String>(flag.name)?.clone()),
            FlagKind::Integer => FlagValue::Integer(*matches.get_one::<u64>(flag.name)?),
            FlagKind::Boolean => FlagValue::Boolean(*matches.get_one::<bool>(flag.name)?),
            FlagKind::StringList => FlagValue::StringList(
                matches.get_many::<String>(flag.name)?.cloned().collect(),
            ),
        };
        debug!(flag = flag.name, "flag set on command line");
        Some((flag.name, value))
    });
    flags_to_value(values)
}

fn run(registry: &GeneratorRegistry, matches: &ArgMatches) -> Result<()> {
    let (name, sub_matches) = matches.subcommand().context("no generator selected")?;
    let generator = registry.get(name)?;

    let spec_path = sub_matches
        .get_one::<PathBuf>("in")
        .context("--in is required")?;
    let manifests = generate(generator, spec_path, sub_matches)?;

    match sub_matches.get_one::<PathBuf>("output") {
        Some(output) => {
            fs::write(output, &manifests)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!(path = %output.display(), "manifests written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(manifests.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn generate(
    generator: &dyn Generator,
    spec_path: &Path,
    matches: &ArgMatches,
) -> Result<String> {
    info!(generator = generator.cmd(), spec = %spec_path.display(), "generating manifests");

    let api = kusk_gen_parser::parse_file(spec_path)
        .with_context(|| format!("failed to load {}", spec_path.display()))?;
    debug!(paths = api.paths.len(), "spec parsed");

    let flags = collect_flags(generator, matches);
    let options = OptionsResolver::new()
        .resolve(&get_options(&api), &flags)
        .context("failed to resolve options")?;

    generator
        .generate(&options, &api)
        .with_context(|| format!("{} generator failed", generator.cmd()))
}
