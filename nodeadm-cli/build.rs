//! Build script for nodeadm-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

fn source_arg() -> Arg {
    Arg::new("config-source")
        .short('c')
        .long("config-source")
        .help("Config source URI; repeat to merge several, lowest precedence first")
        .value_name("URI")
        .action(ArgAction::Append)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("PATH")
}

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    Command::new("nodeadm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve and check node bootstrap configuration")
        .long_about(
            "Command-line tool for resolving, merging, validating and caching the configuration of a node joining a cluster",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommands(vec![
            Command::new("config")
                .about("Inspect the node configuration")
                .subcommands(vec![
                    Command::new("check")
                        .about("Resolve and validate the configuration")
                        .long_about("Resolve the configuration from its sources and validate it")
                        .arg(source_arg())
                        .arg(output_arg().help("Also write the resolved configuration as JSON")),
                    Command::new("dump")
                        .about("Resolve and print the configuration")
                        .long_about("Resolve the configuration from its sources and print it without validating")
                        .arg(source_arg())
                        .arg(output_arg().help("Write to this path instead of stdout"))
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .value_parser(["json", "yaml"])
                                .default_value("json")
                                .help("Output format"),
                        )
                        .arg(
                            Arg::new("external")
                                .long("external")
                                .action(ArgAction::SetTrue)
                                .help("Print the user-facing v1alpha1 document"),
                        ),
                ]),
            Command::new("init")
                .about("Resolve, enrich, validate and cache the node configuration")
                .long_about(
                    "Resolve the configuration against the cache, enrich it from the metadata service when the spec changed, validate it, and cache the result",
                )
                .arg(source_arg())
                .arg(
                    Arg::new("config-cache")
                        .long("config-cache")
                        .value_name("PATH")
                        .help("Location of the config cache"),
                )
                .arg(
                    Arg::new("skip-enrichment")
                        .long("skip-enrichment")
                        .action(ArgAction::SetTrue)
                        .help("Do not query the metadata service for instance details"),
                ),
        ])
}

fn main() {
    // Generate man pages at build time
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    // Generate main nodeadm.1 man page
    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("nodeadm.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
