use ttsimport::importer::{ImportConfig, ImportRuntime, ShareMode};
use ttsimport::logging::init_logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Run { share: ShareMode, print: bool },
    Check,
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut share = ShareMode::Share;
    let mut print = false;
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--no-share" => share = ShareMode::Skip,
            "--print" => print = true,
            "--check" => return Ok(CliMode::Check),
            "--help" | "-h" => return Ok(CliMode::Help),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(CliMode::Run { share, print })
}

fn bootstrap() -> anyhow::Result<ImportRuntime> {
    init_logging()?;
    let config = ImportConfig::from_env()?;
    ImportRuntime::bootstrap(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let (share, print) = match parse_cli_mode(std::env::args())? {
        CliMode::Help => {
            println!("Usage: ttsimport [--no-share] [--print] [--check]");
            println!("  --no-share   Skip granting public read access on the folder tree");
            println!("  --print      Also print the save file JSON to stdout");
            println!("  --check      Only report .A/.B images without a partner, then exit");
            println!("Configuration is read from TTS_IMPORT_* environment variables.");
            return Ok(());
        }
        CliMode::Check => {
            let runtime = bootstrap()?;
            let found = runtime.check().await?;
            for mismatch in &found {
                println!("{}:", mismatch.folder);
                for name in &mismatch.missing_back {
                    println!("  no side B for {name}");
                }
                for name in &mismatch.missing_front {
                    println!("  no side A for {name}");
                }
            }
            if !found.is_empty() {
                anyhow::bail!("{} folder(s) have unpaired side images", found.len());
            }
            println!("all side images are paired");
            return Ok(());
        }
        CliMode::Run { share, print } => (share, print),
    };
    let runtime = bootstrap()?;
    let save = runtime.run(share).await?;
    if print {
        println!("{}", save.to_json(true)?);
    }
    Ok(())
}
