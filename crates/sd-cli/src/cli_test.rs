use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_plan_select_is_repeatable() {
    let cli = Cli::try_parse_from([
        "sdelta",
        "plan",
        "old.yml",
        "new.yml",
        "-s",
        "TABLE:public.a",
        "--select",
        "VIEW:public.v",
    ])
    .unwrap();
    match cli.command {
        Commands::Plan(args) => {
            assert_eq!(args.select, vec!["TABLE:public.a", "VIEW:public.v"]);
            assert_eq!(args.output, PlanOutput::Sql);
        }
        other => panic!("expected plan, got {:?}", other),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["sdelta", "deps", "s.yml", "orders", "-v", "--dialect", "duckdb"])
        .unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.dialect.as_deref(), Some("duckdb"));
}

#[test]
fn test_deps_requires_a_pattern() {
    assert!(Cli::try_parse_from(["sdelta", "deps", "s.yml"]).is_err());
}
