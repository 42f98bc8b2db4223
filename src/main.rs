use clap::{Parser, Subcommand};
use sfbank::{reach, EncodeOptions, SoundFont, Text, Version};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sfbank", about = "Inspect and re-encode SoundFont 2 banks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show bank metadata and entity totals
    Info {
        input: PathBuf,
    },
    /// List presets with their bank/program numbers
    List {
        input: PathBuf,
        /// Also list instruments and samples
        #[arg(short, long)]
        all: bool,
    },
    /// Dump the decoded bank as JSON
    Dump {
        input: PathBuf,
    },
    /// Decode a bank and encode it again
    Rewrite {
        input:  PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Force the ifil version written, e.g. "2.1"
        #[arg(long)]
        file_version: Option<String>,
    },
    /// Report instruments and samples no preset reaches
    Unused {
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    match Cli::parse().command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let sf = SoundFont::open(&input)?;
            let s = sf.summary();
            let text = |t: &Option<Text>| t.as_ref().map(Text::to_string).unwrap_or_else(|| "-".into());

            println!("── SoundFont ────────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Version        {}.{:02}", sf.version.major, sf.version.minor);
            println!("  Name           {}", text(&sf.info.name));
            println!("  Engine         {}", text(&sf.info.engine));
            println!("  Product        {}", text(&sf.info.product));
            println!("  Creator        {}", text(&sf.info.creator));
            println!("  Tools          {}", text(&sf.info.tools));
            println!("  Date           {}", text(&sf.info.date));
            println!("  Copyright      {}", text(&sf.info.copyright));
            if let Some(rom) = sf.rom_version {
                println!("  ROM            {} {}.{:02}", text(&sf.info.rom_name), rom.major, rom.minor);
            }
            println!("  Presets        {} ({} zones)", s.presets, s.preset_zones);
            println!("  Instruments    {} ({} zones)", s.instruments, s.inst_zones);
            println!("  Generators     {}", s.generators);
            println!("  Modulators     {}", s.modulators);
            println!("  Samples        {} ({} frames)", s.samples, s.sample_frames);
            if let Some(comment) = &sf.info.comment {
                println!("  Comment        {comment}");
            }
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, all } => {
            let sf = SoundFont::open(&input)?;
            println!("{:>4} {:>4}  {:<20} {:>5}", "Bank", "Prog", "Preset", "Zones");
            for p in &sf.presets {
                println!("{:>4} {:>4}  {:<20} {:>5}", p.bank, p.preset, p.name, p.zones.len());
            }
            if all {
                println!();
                println!("{:>5}  {:<20} {:>5}", "Index", "Instrument", "Zones");
                for (i, inst) in sf.instruments.iter().enumerate() {
                    println!("{:>5}  {:<20} {:>5}", i, inst.name, inst.zones.len());
                }
                println!();
                println!("{:>5}  {:<20} {:>10} {:>7} {:>5}", "Index", "Sample", "Frames", "Rate", "Key");
                for (i, s) in sf.samples.iter().enumerate() {
                    println!("{:>5}  {:<20} {:>10} {:>7} {:>5}",
                        i, s.name, s.frames(), s.sample_rate, s.original_pitch);
                }
            }
        }

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { input } => {
            let sf = SoundFont::open(&input)?;
            println!("{}", serde_json::to_string_pretty(&sf)?);
        }

        // ── Rewrite ──────────────────────────────────────────────────────────
        Commands::Rewrite { input, output, file_version } => {
            let sf = SoundFont::open(&input)?;
            let opts = EncodeOptions {
                file_version: file_version.as_deref().map(parse_version).transpose()?,
                ..EncodeOptions::default()
            };
            let mut source = sf.sample_source()?;
            let report = sf.save(&output, &mut source, &opts)?;
            println!("Wrote {} ({} bytes, {} samples)", output.display(), report.bytes, report.samples);
        }

        // ── Unused ───────────────────────────────────────────────────────────
        Commands::Unused { input } => {
            let sf = SoundFont::open(&input)?;
            let instruments = reach::unreferenced_instruments(&sf);
            let samples = reach::unreferenced_samples(&sf);
            println!("Unreferenced instruments ({}):", instruments.len());
            for i in instruments {
                println!("  {:>5}  {}", i, sf.instruments[i].name);
            }
            println!("Unreferenced samples ({}):", samples.len());
            for i in samples {
                println!("  {:>5}  {}", i, sf.samples[i].name);
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn parse_version(s: &str) -> Result<Version, String> {
    let (major, minor) = s
        .split_once('.')
        .ok_or_else(|| format!("version '{s}' is not MAJOR.MINOR"))?;
    let field = |v: &str| v.parse::<u16>().map_err(|e| format!("version '{s}': {e}"));
    Ok(Version { major: field(major)?, minor: field(minor)? })
}
