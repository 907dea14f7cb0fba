//! Epoch Breaker level inspector
//!
//! Generates a level from a code, challenge string or fresh seed and prints
//! its summary, validation report and map.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};
    use clap::{Parser, Subcommand};

    use epoch_breaker::challenge::format_thousands;
    use epoch_breaker::generation::{CheckpointKind, LevelLayout, ValidationReport, validate};
    use epoch_breaker::{ChallengeCode, GenerationTuning, LevelGenerator, LevelIdentifier};

    #[derive(Parser, Debug)]
    #[command(name = "epoch-breaker")]
    #[command(about = "Generate and inspect Epoch Breaker levels", version)]
    #[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
    pub struct Cli {
        /// Print the level as JSON instead of a summary and map
        #[arg(long, global = true)]
        pub json: bool,

        /// Generation tuning JSON; missing fields keep their defaults
        #[arg(long, global = true, value_name = "FILE")]
        pub tuning: Option<PathBuf>,

        /// Level code (3-K7XM2P9A) or challenge (3-K7XM2P9A:12450)
        #[arg(value_name = "CODE", required = true)]
        pub code: Option<String>,

        #[command(subcommand)]
        pub command: Option<Command>,
    }

    #[derive(Subcommand, Debug, PartialEq, Eq)]
    pub enum Command {
        /// Originate a level with a fresh random seed
        New {
            #[arg(value_parser = clap::value_parser!(u8).range(0..=9))]
            epoch: u8,
            #[arg(value_parser = clap::value_parser!(u8).range(0..=3))]
            difficulty: u8,
        },
    }

    /// Identifier to generate plus the challenge target, if one was given
    fn resolve_level(cli: &Cli) -> Result<(LevelIdentifier, Option<u32>)> {
        match (&cli.command, &cli.code) {
            (Some(Command::New { epoch, difficulty }), _) => {
                Ok((LevelIdentifier::generate_new(*epoch, *difficulty)?, None))
            }
            (None, Some(text)) => {
                let challenge = ChallengeCode::try_parse(text)
                    .with_context(|| format!("invalid level code or challenge '{}'", text))?;
                let target = text.contains(':').then_some(challenge.target_score);
                Ok((challenge.level, target))
            }
            (None, None) => bail!("expected a level code or the `new` subcommand"),
        }
    }

    fn load_tuning(cli: &Cli) -> Result<GenerationTuning> {
        let Some(path) = &cli.tuning else {
            return Ok(GenerationTuning::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading tuning file {}", path.display()))?;
        let tuning = GenerationTuning::from_json(&text)
            .with_context(|| format!("loading tuning file {}", path.display()))?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    fn print_summary(level: &LevelIdentifier, layout: &LevelLayout, target_score: Option<u32>) {
        let meta = layout.metadata();
        println!("Level {}", level);
        println!(
            "  Epoch {} ({}), difficulty {} ({})",
            level.epoch(),
            level.epoch_name(),
            level.difficulty(),
            level.difficulty_name()
        );
        if let Some(score) = target_score {
            println!("  Challenge target: {}", format_thousands(score));
        }
        println!("  Size: {}x{}", layout.width(), layout.height());
        println!(
            "  Start ({}, {}) -> Goal ({}, {})",
            layout.start().x,
            layout.start().y,
            layout.goal().x,
            layout.goal().y
        );
        println!(
            "  Destructible cells: {} ({} relics)",
            meta.total_destructible_tiles, meta.total_relics
        );
        println!(
            "  Enemies {}, weapon drops {}, rewards {}, checkpoints {}",
            meta.total_enemies, meta.total_weapon_drops, meta.total_rewards, meta.total_checkpoints
        );
        println!("  Difficulty score: {:.2}", meta.difficulty_score);
        let zones: Vec<String> = layout
            .zones()
            .iter()
            .map(|z| format!("{:?}[{}..{})", z.kind, z.start_x, z.end_x))
            .collect();
        println!("  Zones: {}", zones.join(" "));
        if let Some(boss) = layout
            .checkpoints()
            .iter()
            .find(|c| c.kind == CheckpointKind::BossArena)
        {
            println!("  Boss arena entrance: ({}, {})", boss.pos.x, boss.pos.y);
        }
        println!("  Content hash: {:016x}", layout.content_hash());
    }

    fn print_report(report: &ValidationReport) {
        println!(
            "  Validation: {} (start {}, goal {}, reachable {}, in bounds {}, weapons {}, impossible gaps {})",
            if report.passed() { "passed" } else { "FAILED" },
            report.start_accessible,
            report.goal_accessible,
            report.reachable,
            report.entities_in_bounds,
            report.weapon_progression,
            report.impossible_gaps
        );
    }

    pub fn run(cli: Cli) -> Result<()> {
        let (level, target_score) = resolve_level(&cli)?;
        let tuning = load_tuning(&cli)?;
        let layout = LevelGenerator::with_tuning(tuning).generate(&level);
        let report = validate(&layout);

        if cli.json {
            let out = serde_json::json!({
                "code": level.to_code(),
                "identifier": level,
                "target_score": target_score,
                "validation": report,
                "metadata": layout.metadata(),
                "layout": layout,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            return Ok(());
        }

        print_summary(&level, &layout, target_score);
        print_report(&report);
        println!();
        print!("{}", layout.to_ascii());
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use clap::CommandFactory;

        fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
            Cli::try_parse_from(std::iter::once("epoch-breaker").chain(args.iter().copied()))
        }

        #[test]
        fn test_command_definition() {
            Cli::command().debug_assert();
        }

        #[test]
        fn test_parse_level_code() {
            let cli = parse(&["3-K7XM2P9A"]).unwrap();
            assert_eq!(cli.code.as_deref(), Some("3-K7XM2P9A"));
            assert!(cli.command.is_none());
            assert!(!cli.json);

            let (level, target) = resolve_level(&cli).unwrap();
            assert_eq!(level.to_code(), "3-K7XM2P9A");
            assert_eq!(target, None);
        }

        #[test]
        fn test_parse_challenge_with_options() {
            let cli = parse(&["--json", "--tuning", "knobs.json", "3-K7XM2P9A:12450"]).unwrap();
            assert!(cli.json);
            assert_eq!(cli.tuning, Some(PathBuf::from("knobs.json")));

            let (level, target) = resolve_level(&cli).unwrap();
            assert_eq!(level.difficulty(), 1);
            assert_eq!(target, Some(12450));
        }

        #[test]
        fn test_parse_new_subcommand() {
            let cli = parse(&["new", "3", "1", "--json"]).unwrap();
            assert_eq!(
                cli.command,
                Some(Command::New {
                    epoch: 3,
                    difficulty: 1
                })
            );
            assert!(cli.json);

            let (level, target) = resolve_level(&cli).unwrap();
            assert_eq!((level.epoch(), level.difficulty()), (3, 1));
            assert_eq!(target, None);
        }

        #[test]
        fn test_rejects_bad_arguments() {
            assert!(parse(&[]).is_err());
            assert!(parse(&["new", "12", "0"]).is_err());
            assert!(parse(&["new", "3", "4"]).is_err());
            assert!(parse(&["new", "3"]).is_err());
            assert!(parse(&["3-K7XM2P9A", "extra"]).is_err());

            let cli = parse(&["not-a-code"]).unwrap();
            assert!(resolve_level(&cli).is_err());
        }

        #[test]
        fn test_missing_tuning_file_is_an_error() {
            let cli = parse(&["--tuning", "/nonexistent/tuning.json", "3-K7XM2P9A"]).unwrap();
            let err = load_tuning(&cli).unwrap_err();
            assert!(err.to_string().contains("reading tuning file"));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::init();
    cli::run(cli::Cli::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The inspector is native only; the library is the wasm surface
}
