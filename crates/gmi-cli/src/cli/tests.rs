use super::*;
use clap::Parser;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_install() {
    match parse(&["gmi", "install"]) {
        CliCommand::Install { target } => assert!(target.is_none()),
        _ => panic!("expected Install"),
    }
}

#[test]
fn cli_parse_install_target() {
    match parse(&["gmi", "install", "--target", "/opt/modded-game"]) {
        CliCommand::Install { target } => {
            assert_eq!(target.as_deref(), Some(std::path::Path::new("/opt/modded-game")));
        }
        _ => panic!("expected Install with --target"),
    }
}

#[test]
fn cli_parse_update() {
    match parse(&["gmi", "update"]) {
        CliCommand::Update { apply } => assert!(!apply),
        _ => panic!("expected Update"),
    }
}

#[test]
fn cli_parse_update_apply() {
    match parse(&["gmi", "update", "--apply"]) {
        CliCommand::Update { apply } => assert!(apply),
        _ => panic!("expected Update with --apply"),
    }
}

#[test]
fn cli_parse_cache_size() {
    match parse(&["gmi", "cache", "size"]) {
        CliCommand::Cache {
            action: CacheAction::Size,
        } => {}
        _ => panic!("expected Cache Size"),
    }
}

#[test]
fn cli_parse_cache_clear() {
    match parse(&["gmi", "cache", "clear"]) {
        CliCommand::Cache {
            action: CacheAction::Clear,
        } => {}
        _ => panic!("expected Cache Clear"),
    }
}

#[test]
fn cli_parse_checksum() {
    match parse(&["gmi", "checksum", "/tmp/mod.zip"]) {
        CliCommand::Checksum { path } => {
            assert_eq!(path, std::path::PathBuf::from("/tmp/mod.zip"));
        }
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["gmi", "frobnicate"]).is_err());
}
